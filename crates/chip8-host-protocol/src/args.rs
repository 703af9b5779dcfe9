/// Positional startup arguments handed to the guest's entry point.
///
/// The guest reads them by index, so the order is part of the ABI:
///
/// | index | value          |
/// |-------|----------------|
/// | 0     | program path   |
/// | 1     | debug flag     |
/// | 2     | speed          |
/// | 3     | pixel size     |
/// | 4     | foreground     |
/// | 5     | background     |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestArgs {
    pub program_path: String,
    pub debug: bool,
    pub speed: u32,
    pub pixel_size: i32,
    pub foreground: String,
    pub background: String,
}

impl GuestArgs {
    /// Number of positional arguments the guest expects.
    pub const LEN: usize = 6;

    pub fn to_argv(&self) -> Vec<String> {
        vec![
            self.program_path.clone(),
            self.debug.to_string(),
            self.speed.to_string(),
            self.pixel_size.to_string(),
            self.foreground.clone(),
            self.background.clone(),
        ]
    }
}
