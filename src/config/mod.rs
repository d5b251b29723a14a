/// Database configuration and connection management
pub mod database;

/// Seed data (super admin, role and permission catalog) from config.toml
pub mod seed;
