pub mod common;
pub mod service_record;
pub mod transaction;

pub use common::{Displayable, Identifiable};
pub use service_record::{
    ServiceRecord, ServiceRecordDraft, ServiceType, TireSelection, TireServiceType,
};
pub use transaction::{AccountType, Transaction, TransactionDraft, TransactionType};
