pub const fn project_name() -> &'static str {
    "driftsim"
}

pub const fn server_identifier() -> &'static str {
    concat!("driftsim/", env!("CARGO_PKG_VERSION"))
}
