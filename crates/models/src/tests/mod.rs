/// Connection and pool configuration tests
pub mod db_tests;
