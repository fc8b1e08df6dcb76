// Copyright 2025 tcprpc Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # tcprpc CLI
//!
//! Command-line interface for the tcprpc request/response system.
//!
//! ## Key Commands
//!
//! - `tcprpc serve`: Run a server exposing `add`, `reverse_string` and `get_time`,
//!   optionally with artificial delay, response dropping and at-most-once caching
//! - `tcprpc call`: Make one call with timeouts and retries and print a one-line summary
//!
//! The binary parses flags with `argh`; the helpers that turn flags into
//! configuration and responses into output live in [`call`] and [`serve`].

pub mod call;
pub mod serve;
