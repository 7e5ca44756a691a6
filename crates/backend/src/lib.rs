#![allow(clippy::type_complexity, clippy::too_many_arguments)]

pub mod api;
pub mod dashboards;
pub mod routes;
pub mod shared;
