pub mod clock;
pub mod nonce_service;
pub mod replay_guard;
pub mod session_service;
pub mod sign_in_service;
pub mod signature_service;
pub mod token_codec;
