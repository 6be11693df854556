pub mod lab_tests;
pub mod orders;
pub mod patients;
pub mod server;
