pub mod health;
pub mod s3_url;
pub mod status;
pub mod upload;
