pub mod decrypt;
pub mod encrypt;
pub mod info;
pub mod recover;

pub use decrypt::{decrypt_pack_file, DecryptSummary};
pub use encrypt::{encrypt_pack_file, EncryptSummary};
pub use info::show_info;
pub use recover::{recover_key, RecoverOptions};
