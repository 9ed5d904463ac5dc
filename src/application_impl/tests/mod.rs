
mod lifecycle_tests;
mod registry_tests;
