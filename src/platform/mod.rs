//! Platform collaborators: the external signer and removable media.

pub mod media;
pub mod signer;

pub use media::{DeviceAttrs, DeviceSnapshot, LinuxMedia, MediaEnumerator};
pub use signer::{ElectrumCli, TransactionSigner, TxOutput};
