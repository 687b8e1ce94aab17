use dotmatrix_core::{cartridge::Cartridge, gameboy::GameBoy};

/// Build a 32 KiB ROM image with `program` placed at the entry point.
pub fn test_rom(program: &[u8]) -> Vec<u8> {
    let mut rom = vec![0u8; 0x8000];
    rom[0x0100..0x0100 + program.len()].copy_from_slice(program);
    rom
}

/// A post-boot machine with `program` loaded at 0x0100 and no pending
/// interrupt requests.
#[allow(dead_code)]
pub fn gb_with_program(program: &[u8]) -> GameBoy {
    let mut gb = GameBoy::new();
    gb.mmu.load_cart(Cartridge::load(test_rom(program)));
    gb.mmu.write_byte(0xFF0F, 0x00);
    gb
}
