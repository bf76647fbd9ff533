pub mod prop;
