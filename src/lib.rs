pub mod cache;
pub mod config;
pub mod db;
pub mod filesystem;
pub mod follow;
pub mod form;
pub mod init;
pub mod middleware;
pub mod orm;
pub mod paginator;
pub mod post;
pub mod session;
pub mod user;
pub mod web;
