pub mod schema_migrator;
