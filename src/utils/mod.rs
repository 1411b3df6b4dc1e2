pub mod eth_address_validator;
pub mod keccak;
pub mod request_origin;
#[cfg(test)]
pub mod test_app_state;
