use std::{fmt, fs, io, path::Path};

/// Size of the ROM window at 0x0000-0x7FFF. There is no mapper hardware in
/// this machine model; images larger than the window only expose their first
/// bank.
pub const ROM_WINDOW: usize = 0x8000;

#[derive(Debug)]
pub enum CartridgeError {
    Io(io::Error),
    Empty,
}

impl fmt::Display for CartridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CartridgeError::Io(e) => write!(f, "failed to read ROM: {e}"),
            CartridgeError::Empty => write!(f, "ROM image is empty"),
        }
    }
}

impl std::error::Error for CartridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CartridgeError::Io(e) => Some(e),
            CartridgeError::Empty => None,
        }
    }
}

impl From<io::Error> for CartridgeError {
    fn from(e: io::Error) -> Self {
        CartridgeError::Io(e)
    }
}

#[derive(Debug)]
pub struct Cartridge {
    pub rom: Vec<u8>,
    pub title: String,
}

impl Cartridge {
    /// Wrap a raw ROM image. The header title (0x0134-0x0143) is decoded for
    /// display purposes; nothing else in the header affects emulation.
    pub fn load(rom: Vec<u8>) -> Self {
        let title = rom
            .get(0x0134..0x0144)
            .map(|bytes| {
                bytes
                    .iter()
                    .take_while(|&&b| b != 0)
                    .filter(|b| b.is_ascii_graphic() || **b == b' ')
                    .map(|&b| b as char)
                    .collect()
            })
            .unwrap_or_default();
        Self { rom, title }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CartridgeError> {
        let rom = fs::read(path)?;
        if rom.is_empty() {
            return Err(CartridgeError::Empty);
        }
        Ok(Self::load(rom))
    }

    /// Read from the ROM window. Out-of-image addresses float high.
    pub fn read(&self, addr: u16) -> u8 {
        self.rom.get(addr as usize).copied().unwrap_or(0xFF)
    }
}
