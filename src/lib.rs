pub mod catalog;
pub mod config;
pub mod isbn;
pub mod ledger;
pub mod lookup;
pub mod session;

pub use catalog::amazon::{AmazonClient, Credentials};
pub use catalog::{Catalog, CatalogError, Locale};
pub use config::{ConfigError, FileConfig, Overrides, Settings};
pub use isbn::{Isbn, SeenSet};
pub use ledger::{Ledger, LedgerError};
pub use lookup::{lookup, LookupError, Record};
pub use session::{Outcome, Session, SessionOptions};
