/*!
# NNI Predictor Web Application

A browser-based prediction form for polymer NNI values, built in Rust.

## Overview

A user enters four numeric measurements plus batch metadata into a
single-page form; a pre-trained scaler + linear regression pair produces a
predicted NNI value; the record is appended to the configured persistence
backends and optionally broadcast to messaging subscribers. Subscriber
identifiers are captured by a separate webhook listener.

## Architecture

The application follows a client-server architecture:

### Frontend Layer
- **Technologies**: HTML, CSS, vanilla JS
- A single embedded form page that posts submissions to the backend and
  renders the returned prediction and warnings.

### Backend Layer
- **Technologies**: Rust, axum, tokio
- **Core Components**:
  - Form Validation - presence checks on text and numeric inputs
  - Inference Adapter - feature scaling + linear regression
  - Record Builder - maps a validated submission and prediction to one row
  - Recorder - read-modify-write append to each configured sink
  - Webhook Listener - signature-verified subscriber capture on its own port

### Persistence Layer
- Remote worksheet addressed by URL (full-table read/write over HTTP)
- Local CSV file, optionally committed and pushed to a git remote
- Plain-text subscriber list behind an in-process lock

## Modules

- **config**: configuration file loading and presence checks
- **model**: scaler + regression parameters and prediction
- **form**: raw form fields and validation into a `Submission`
- **record**: the persisted row schema and record construction
- **table**: in-memory table image with CSV encode/decode
- **sheet**: remote worksheet client (read/write full table)
- **saving**: local CSV store and git sync
- **recorder**: fan-out of one record to every configured sink
- **notify**: messaging push/reply client and best-effort broadcast
- **subscribers**: deduplicated subscriber id store
- **webhook**: inbound event listener with signature verification
- **app**: routing and the predict endpoint
*/

pub mod app;
pub mod config;
pub mod form;
pub mod model;
pub mod notify;
pub mod record;
pub mod recorder;
pub mod saving;
pub mod sheet;
pub mod subscribers;
pub mod table;
pub mod webhook;

/// Re-export everything from these modules to make it easier to use
pub use config::*;
pub use form::*;
pub use model::*;
pub use notify::*;
pub use record::*;
pub use recorder::*;
pub use saving::*;
pub use sheet::*;
pub use subscribers::*;
pub use table::*;

/// Boxed error type used on fallible seams that cross async boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
