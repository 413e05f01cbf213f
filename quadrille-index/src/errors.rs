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

use std::error::Error;
use std::fmt;

/// Helper type for a call that could go wrong inside `quadrille-index`.
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors raised by the quadtree and its reverse index.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexError {
    /// `Get`/`Update*`/`Delete` of an id with no current owner node.
    LocationNotFound(String),
    /// `Delete` of an id that was already absent, detected ahead of
    /// consensus so the caller can avoid logging a no-op write.
    NonExistentLocationDelete(String),
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IndexError::LocationNotFound(id) => write!(f, "location '{}' was not found", id),
            IndexError::NonExistentLocationDelete(id) => {
                write!(f, "location '{}' does not exist, nothing to delete", id)
            }
        }
    }
}

impl Error for IndexError {}
