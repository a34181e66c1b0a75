//! Install-script edge service.
//!
//! `curl` and `wget` callers get `/lib.sh` from the asset directory, whatever
//! path they requested; every other caller is redirected to the project page.

pub mod assets;
pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
