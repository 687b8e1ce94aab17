use clap::Parser;
use dotmatrix_core::{
    cartridge::Cartridge,
    diagnostics,
    gameboy::{GameBoy, FRAME_RATE_HZ},
    input::Buttons,
    ppu::{SCREEN_HEIGHT, SCREEN_WIDTH},
};
use log::info;
use pixels::{Pixels, SurfaceTexture};
use std::fmt;
use std::io::Write as _;
use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};
use winit::{
    event::{ElementState, Event, VirtualKeyCode, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

/// Display colors for the four DMG shades, lightest to darkest.
const SHADES: [u32; 4] = [0xFFFF_FFFF, 0xFFC0_C0C0, 0xFF2C_2C2C, 0xFF00_0000];

#[derive(Parser)]
struct Args {
    /// Path to ROM file
    rom: Option<PathBuf>,

    /// Path to boot ROM file
    #[arg(long)]
    bootrom: Option<PathBuf>,

    /// Enable debug logging of CPU state and serial output
    #[arg(long)]
    debug: bool,

    /// Run without opening a window
    #[arg(long)]
    headless: bool,

    /// Number of frames to run in headless mode
    #[arg(long)]
    frames: Option<usize>,

    /// Number of seconds to run in headless mode
    #[arg(long)]
    seconds: Option<u64>,

    /// Number of CPU cycles to run in headless mode
    #[arg(long)]
    cycles: Option<u64>,

    /// Window scale factor
    #[arg(long, default_value_t = 3)]
    scale: u32,
}

/// Forwards core diagnostics into the `log` crate.
struct LogBridge;

impl diagnostics::LogSink for LogBridge {
    fn log(&self, level: diagnostics::Level, target: &'static str, args: fmt::Arguments) {
        let level = match level {
            diagnostics::Level::Trace => log::Level::Trace,
            diagnostics::Level::Info => log::Level::Info,
            diagnostics::Level::Warn => log::Level::Warn,
        };
        log::log!(target: target, level, "{args}");
    }
}

fn print_serial(bytes: &[u8]) {
    if bytes.is_empty() {
        return;
    }
    let mut stdout = std::io::stdout();
    for &b in bytes {
        let _ = write!(stdout, "{}", b as char);
    }
    let _ = stdout.flush();
}

fn render_shades(frame: &mut [u32], shades: &[u8]) {
    for (dst, &shade) in frame.iter_mut().zip(shades) {
        *dst = SHADES[shade as usize & 0x03];
    }
}

fn main() {
    env_logger::init();
    let _ = diagnostics::try_set_log_sink(Box::new(LogBridge));
    let mut args = Args::parse();

    let rom_path = match args.rom.take() {
        Some(p) => p,
        None => {
            eprintln!("Usage: dotmatrix <path-to-ROM>");
            process::exit(1);
        }
    };

    let cart = match Cartridge::from_file(&rom_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load ROM: {e}");
            process::exit(1);
        }
    };
    if !cart.title.is_empty() {
        info!("loaded \"{}\" ({} bytes)", cart.title, cart.rom.len());
    }

    // With a boot ROM the machine starts from the power-on state and the
    // boot code initializes the hardware; without one we start post-boot.
    let mut gb = if args.bootrom.is_some() {
        GameBoy::new_power_on()
    } else {
        GameBoy::new()
    };
    gb.mmu.load_cart(cart);

    if let Some(path) = args.bootrom.take() {
        match std::fs::read(&path) {
            Ok(data) => gb.mmu.load_boot_rom(data),
            Err(e) => {
                eprintln!("Failed to load boot ROM: {e}");
                process::exit(1);
            }
        }
    }

    if args.headless {
        run_headless(gb, &args);
    } else {
        run_windowed(gb, args.scale, args.debug);
    }
}

fn run_headless(mut gb: GameBoy, args: &Args) {
    let frame_limit = args.frames;
    let cycle_limit = args.cycles;
    let second_limit = args.seconds.map(Duration::from_secs);

    let start = Instant::now();
    let mut frame_count = 0usize;
    while gb.cpu.running {
        gb.run_frame();
        gb.mmu.ppu.clear_frame_flag();
        print_serial(&gb.mmu.take_serial());

        if args.debug && frame_count % 60 == 0 {
            eprintln!("{}", gb.cpu.debug_state());
        }

        frame_count += 1;
        if let Some(max) = frame_limit {
            if frame_count >= max {
                break;
            }
        }
        if let Some(max) = cycle_limit {
            if gb.cpu.cycles >= max {
                break;
            }
        }
        if let Some(limit) = second_limit {
            if start.elapsed() >= limit {
                break;
            }
        }
    }
}

fn run_windowed(mut gb: GameBoy, scale: u32, debug: bool) {
    let frame_period = Duration::from_secs_f64(1.0 / FRAME_RATE_HZ);
    let mut frame = vec![0u32; SCREEN_WIDTH * SCREEN_HEIGHT];
    let mut frame_count = 0u64;
    let mut buttons = Buttons::default();

    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title("dotmatrix")
        .with_inner_size(winit::dpi::LogicalSize::new(
            (SCREEN_WIDTH as u32 * scale) as f64,
            (SCREEN_HEIGHT as u32 * scale) as f64,
        ))
        .build(&event_loop)
        .expect("Failed to create window");

    let size = window.inner_size();
    let surface = SurfaceTexture::new(size.width, size.height, &window);
    let mut pixels = Pixels::new(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32, surface)
        .expect("Pixels error");

    let mut frame_start = Instant::now();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => *control_flow = ControlFlow::Exit,
                WindowEvent::Resized(size) => {
                    let _ = pixels.resize_surface(size.width, size.height);
                }
                WindowEvent::KeyboardInput { input, .. } => {
                    if let Some(key) = input.virtual_keycode {
                        let pressed = input.state == ElementState::Pressed;
                        let mut handled = true;
                        match key {
                            VirtualKeyCode::Right => buttons.right = pressed,
                            VirtualKeyCode::Left => buttons.left = pressed,
                            VirtualKeyCode::Up => buttons.up = pressed,
                            VirtualKeyCode::Down => buttons.down = pressed,
                            VirtualKeyCode::A => buttons.a = pressed,
                            VirtualKeyCode::S => buttons.b = pressed,
                            VirtualKeyCode::LShift | VirtualKeyCode::RShift => {
                                buttons.select = pressed
                            }
                            VirtualKeyCode::Return => buttons.start = pressed,
                            VirtualKeyCode::Escape => {
                                if pressed {
                                    *control_flow = ControlFlow::Exit;
                                }
                                handled = false;
                            }
                            _ => handled = false,
                        }
                        if handled {
                            gb.mmu.set_buttons(buttons);
                        }
                    }
                }
                _ => {}
            },
            Event::MainEventsCleared => {
                if !gb.cpu.running {
                    *control_flow = ControlFlow::Exit;
                    return;
                }

                gb.run_frame();
                gb.mmu.ppu.clear_frame_flag();

                render_shades(&mut frame, gb.mmu.ppu.framebuffer());
                window.request_redraw();

                print_serial(&gb.mmu.take_serial());
                if debug && frame_count % 60 == 0 {
                    eprintln!("{}", gb.cpu.debug_state());
                }
                frame_count += 1;

                // Pace to the wall-clock frame boundary.
                let elapsed = frame_start.elapsed();
                if elapsed < frame_period {
                    std::thread::sleep(frame_period - elapsed);
                }
                frame_start = Instant::now();
            }
            Event::RedrawRequested(_) => {
                pixels
                    .frame_mut()
                    .copy_from_slice(bytemuck::cast_slice(&frame));
                if pixels.render().is_err() {
                    *control_flow = ControlFlow::Exit;
                }
            }
            _ => {}
        }
    });
}
