//! Domain types for the OMERO.insight client
//!
//! This crate defines the values handed between the login screen, the
//! metadata editor and the downstream connection workflow: user credentials,
//! connection speed presets and textual annotations.
//!
//! # Example
//!
//! ```
//! use model::{ConnectionSpeed, UserCredentials};
//!
//! let credentials =
//!     UserCredentials::new("root", "omero", "demo.openmicroscopy.org:4064", ConnectionSpeed::High)
//!         .unwrap();
//! assert_eq!(credentials.hostname(), "demo.openmicroscopy.org");
//! assert_eq!(credentials.port(), Some(4064));
//! ```

pub mod annotation;
pub mod credentials;
pub mod error;
pub mod types;

pub use annotation::{AnnotationId, DataToSave, TextualAnnotation};
pub use credentials::{DEFAULT_PORT, MAX_PORT, MIN_PORT, UserCredentials};
pub use error::{CredentialsError, Result};
pub use types::ConnectionSpeed;
