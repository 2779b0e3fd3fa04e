// HTTP handlers module structure

pub(crate) mod health_handlers;
pub(crate) mod textfile_handlers;
