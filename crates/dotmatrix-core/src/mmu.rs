use crate::{
    cartridge::Cartridge,
    input::{Buttons, Input},
    ppu::{Ppu, OAM_SIZE},
    serial::Serial,
    timer::Timer,
};

const WRAM_SIZE: usize = 0x2000;
const CART_RAM_SIZE: usize = 0x2000;
const HRAM_SIZE: usize = 0x7F;

/// T-cycles the bus stays locked out after an OAM DMA trigger
/// (160 bytes, one M-cycle each).
pub const DMA_LOCKOUT_CYCLES: u32 = 640;

/// OAM DMA engine. The copy itself is instantaneous from the emulator's
/// point of view; only the bus lockout is timed.
struct DmaUnit {
    /// Last value written to 0xFF46, for register read-back.
    value: u8,
    running: bool,
    cycles: u32,
}

pub struct Mmu {
    pub wram: [u8; WRAM_SIZE],
    pub cart_ram: [u8; CART_RAM_SIZE],
    pub hram: [u8; HRAM_SIZE],
    /// Backing store for I/O addresses no hardware unit claims; writes there
    /// land and read back unchanged.
    io: [u8; 0x80],
    pub cart: Option<Cartridge>,
    pub boot_rom: Option<Vec<u8>>,
    pub boot_mapped: bool,
    pub if_reg: u8,
    pub ie_reg: u8,
    pub serial: Serial,
    pub ppu: Ppu,
    pub timer: Timer,
    pub input: Input,
    dma: DmaUnit,
}

impl Mmu {
    /// An MMU in the post-boot state, ready to run a cartridge without a
    /// boot ROM.
    pub fn new() -> Self {
        let mut mmu = Self::new_power_on();
        mmu.ppu.apply_post_boot_state();
        mmu.timer.div = 0xAB;
        mmu
    }

    /// An MMU in the power-on state a boot ROM expects.
    pub fn new_power_on() -> Self {
        Self {
            wram: [0; WRAM_SIZE],
            cart_ram: [0; CART_RAM_SIZE],
            hram: [0; HRAM_SIZE],
            io: [0; 0x80],
            cart: None,
            boot_rom: None,
            boot_mapped: false,
            if_reg: 0xE1,
            ie_reg: 0,
            serial: Serial::new(),
            ppu: Ppu::new(),
            timer: Timer::new(),
            input: Input::new(),
            dma: DmaUnit {
                value: 0,
                running: false,
                cycles: 0,
            },
        }
    }

    pub fn load_cart(&mut self, cart: Cartridge) {
        self.cart = Some(cart);
    }

    pub fn load_boot_rom(&mut self, data: Vec<u8>) {
        self.boot_rom = Some(data);
        self.boot_mapped = true;
    }

    pub fn read_byte(&self, addr: u16) -> u8 {
        // While the OAM DMA engine owns the bus, only HRAM stays readable.
        if self.dma.running && !(0xFF80..=0xFFFE).contains(&addr) {
            return 0xFF;
        }

        // Pinned LY value so test-ROM busy-waits terminate under the
        // instruction logger.
        #[cfg(feature = "test-log")]
        if addr == 0xFF44 {
            return 0x90;
        }

        match addr {
            0x0000..=0x00FF if self.boot_mapped => self
                .boot_rom
                .as_ref()
                .and_then(|b| b.get(addr as usize).copied())
                .unwrap_or(0xFF),
            0x0000..=0x7FFF => self.cart.as_ref().map(|c| c.read(addr)).unwrap_or(0xFF),
            0x8000..=0x9FFF => {
                if self.ppu.vram_accessible() {
                    self.ppu.vram[(addr - 0x8000) as usize]
                } else {
                    0xFF
                }
            }
            0xA000..=0xBFFF => self.cart_ram[(addr - 0xA000) as usize],
            0xC000..=0xDFFF => self.wram[(addr - 0xC000) as usize],
            0xE000..=0xFDFF => self.wram[(addr - 0xE000) as usize],
            0xFE00..=0xFE9F => {
                if self.ppu.oam_accessible() {
                    self.ppu.oam[(addr - 0xFE00) as usize]
                } else {
                    0xFF
                }
            }
            0xFEA0..=0xFEFF => 0xFF,
            0xFF00 => self.input.read(),
            0xFF01 | 0xFF02 => self.serial.read(addr),
            0xFF04..=0xFF07 => self.timer.read(addr),
            0xFF0F => self.if_reg,
            0xFF40..=0xFF45 | 0xFF47..=0xFF4B => self.ppu.read_reg(addr),
            0xFF46 => self.dma.value,
            0xFF00..=0xFF7F => self.io[(addr - 0xFF00) as usize],
            0xFF80..=0xFFFE => self.hram[(addr - 0xFF80) as usize],
            0xFFFF => self.ie_reg,
            _ => 0xFF,
        }
    }

    pub fn write_byte(&mut self, addr: u16, val: u8) {
        match addr {
            // Cartridge ROM is read-only on this bus.
            0x0000..=0x7FFF => {}
            0x8000..=0x9FFF => {
                if self.ppu.vram_accessible() {
                    self.ppu.vram[(addr - 0x8000) as usize] = val;
                }
            }
            0xA000..=0xBFFF => self.cart_ram[(addr - 0xA000) as usize] = val,
            0xC000..=0xDFFF => self.wram[(addr - 0xC000) as usize] = val,
            0xE000..=0xFDFF => self.wram[(addr - 0xE000) as usize] = val,
            0xFE00..=0xFE9F => {
                if self.ppu.oam_accessible() {
                    self.ppu.oam[(addr - 0xFE00) as usize] = val;
                }
            }
            0xFEA0..=0xFEFF => {}
            0xFF00 => self.input.write(val),
            0xFF01 | 0xFF02 => self.serial.write(addr, val),
            0xFF04..=0xFF07 => self.timer.write(addr, val),
            0xFF0F => self.if_reg = (val & 0x1F) | 0xE0,
            0xFF40..=0xFF45 | 0xFF47..=0xFF4B => self.ppu.write_reg(addr, val, &mut self.if_reg),
            0xFF46 => self.start_dma(val),
            0xFF50 => {
                if self.boot_mapped {
                    core_info!(target: "mmu", "boot ROM unmapped");
                }
                // One-way transition: the overlay never comes back.
                self.boot_mapped = false;
                self.io[0x50] = val;
            }
            0xFF00..=0xFF7F => self.io[(addr - 0xFF00) as usize] = val,
            0xFF80..=0xFFFE => self.hram[(addr - 0xFF80) as usize] = val,
            0xFFFF => self.ie_reg = val,
            _ => {}
        }
    }

    /// Copy `value << 8 .. + 0xA0` into OAM and begin the bus lockout.
    fn start_dma(&mut self, value: u8) {
        self.dma.value = value;
        let src = (value as u16) << 8;
        for i in 0..OAM_SIZE as u16 {
            self.ppu.oam[i as usize] = self.dma_read_byte(src.wrapping_add(i));
        }
        self.dma.running = true;
        self.dma.cycles = 0;
    }

    /// Source reads for the DMA engine, which owns the bus and is not
    /// subject to the lockout or PPU mode gating.
    fn dma_read_byte(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x00FF if self.boot_mapped => self
                .boot_rom
                .as_ref()
                .and_then(|b| b.get(addr as usize).copied())
                .unwrap_or(0xFF),
            0x0000..=0x7FFF => self.cart.as_ref().map(|c| c.read(addr)).unwrap_or(0xFF),
            0x8000..=0x9FFF => self.ppu.vram[(addr - 0x8000) as usize],
            0xA000..=0xBFFF => self.cart_ram[(addr - 0xA000) as usize],
            0xC000..=0xDFFF => self.wram[(addr - 0xC000) as usize],
            0xE000..=0xFDFF => self.wram[(addr - 0xE000) as usize],
            _ => 0xFF,
        }
    }

    /// Advance the DMA lockout window.
    pub fn dma_step(&mut self, cycles: u32) {
        if self.dma.running {
            self.dma.cycles += cycles;
            if self.dma.cycles >= DMA_LOCKOUT_CYCLES {
                self.dma.running = false;
            }
        }
    }

    /// Return true if the DMA lockout is in progress.
    pub fn dma_active(&self) -> bool {
        self.dma.running
    }

    /// Advance all bus-side hardware by the T-cycles one CPU step consumed.
    pub fn tick(&mut self, cycles: u32) {
        self.ppu.step(cycles, &mut self.if_reg);
        self.timer.step(cycles, &mut self.if_reg);
        self.dma_step(cycles);
        self.serial.step();
    }

    /// STOP and DIV writes funnel through here so the timer accumulators
    /// reset together.
    pub fn reset_div(&mut self) {
        self.timer.reset_div();
    }

    /// Host-side button update; raises the joypad interrupt on press edges.
    pub fn set_buttons(&mut self, buttons: Buttons) {
        self.input.set_buttons(buttons, &mut self.if_reg);
    }

    pub fn take_serial(&mut self) -> Vec<u8> {
        self.serial.take_output()
    }
}

impl Default for Mmu {
    fn default() -> Self {
        Self::new()
    }
}
