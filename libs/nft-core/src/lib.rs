pub mod core {
    pub mod async_loop;
    pub mod bits;
    pub mod functional;
    pub mod id_macros;
    pub mod logging;
    pub mod persistence;
    pub mod test_util;
}
