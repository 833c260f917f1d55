pub(crate) mod security;
