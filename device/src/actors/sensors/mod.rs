pub mod hts221;
