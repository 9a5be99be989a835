mod common;
mod integrity;
