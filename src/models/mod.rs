pub mod signal;

pub use signal::{
    Action, InvalidRowKey, RowKey, RowKeyFilter, Signal, SignalPayload, StoredSignal,
};
