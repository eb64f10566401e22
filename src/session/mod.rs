//! Session State
//!
//! Everything one dashboard user carries between requests:
//!
//! - [`ViewState`]: active [`Page`], [`Filters`] and [`Selection`]
//! - [`Credentials`]: the single configured login
//! - [`SessionStore`]: login flag and preferences persisted as JSON
//! - [`DatasetCache`]: the fetched dataset, dropped on logout

mod auth;
mod cache;
mod error;
mod state;
mod store;

pub use auth::Credentials;
pub use cache::{Dataset, DatasetCache};
pub use error::{AuthError, SessionError, SessionResult};
pub use state::{Filters, OrgRelationship, Page, Selection, ViewState};
pub use store::{SessionData, SessionStore};
