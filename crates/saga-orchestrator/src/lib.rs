//! Saga orchestration for multi-step operations with rollback.
//!
//! A saga is an ordered sequence of steps, each pairing an operation with a
//! compensation that undoes it. Steps run strictly one after another and each
//! operation receives the previous step's result. When an operation fails,
//! the steps that already completed are compensated in reverse order; every
//! compensation is attempted even if another one fails, and the run reports
//! the original error together with all compensation errors.
//!
//! ```
//! use std::sync::Mutex;
//!
//! use saga_orchestrator::{SagaBuilder, StepError};
//!
//! let undone = Mutex::new(Vec::new());
//! let undone = &undone;
//!
//! let saga = SagaBuilder::new()
//!     .add_named_step(
//!         "reserve",
//!         |()| async { Ok::<_, StepError>(17_u32) },
//!         move |reservation: u32| async move {
//!             undone.lock().expect("lock").push(format!("release {reservation}"));
//!             Ok(())
//!         },
//!     )
//!     .add_named_step(
//!         "charge",
//!         |_reservation: u32| async { Err::<u32, _>(StepError::new("card declined")) },
//!         |_charge| async { Ok(()) },
//!     )
//!     .build();
//!
//! let failure = futures::executor::block_on(saga.execute()).unwrap_err();
//!
//! assert_eq!(failure.failed_step, "charge");
//! assert!(failure.is_fully_compensated());
//! assert_eq!(*undone.lock().expect("lock"), vec!["release 17".to_string()]);
//! ```

mod audit;
mod builder;
mod error;
mod saga;
mod step;
mod value;

pub use audit::{SagaAuditLog, StepRecord, StepStatus};
pub use builder::SagaBuilder;
pub use error::{CompensationError, SagaFailure, StepError};
pub use saga::{Saga, SagaState};
