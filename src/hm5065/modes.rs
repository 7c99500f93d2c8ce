//! Supported output resolutions and pixel formats, and the best-fit negotiation between a
//! requested size and the resolutions the sensor can produce.

use super::regs::{self, Program, RegisterOp};

/// A supported output resolution together with the program that selects it.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Mode {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in lines.
    pub height: u32,
    /// Register program switching the sensor to this mode.
    pub program: Program,
}

/// YUV 4:2:2 byte orders the sensor can emit.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PixelLayout {
    Yuyv,
    Yvyu,
    Uyvy,
    Vyuy,
}

/// Output format: pixel order and the program selecting it.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct FormatDescriptor {
    /// Human readable name.
    pub description: &'static str,
    pub pixel_layout: PixelLayout,
    /// Register program selecting the byte order.
    pub program: Program,
    pub bytes_per_pixel: u8,
}

/// Field order of the negotiated stream. Only progressive scan is produced.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Field {
    Progressive,
}

/// The size actually granted for a request, always one of the cataloged modes.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct NegotiatedSize {
    /// Granted width in pixels.
    pub width: u32,
    /// Granted height in lines.
    pub height: u32,
    pub field: Field,
}

/// Parallel bus signalling the sensor drives.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct BusConfig {
    /// The sensor drives the sync signals.
    pub master: bool,
    pub vsync_active_high: bool,
    pub hsync_active_high: bool,
    pub pclk_rising_edge: bool,
}

/// Bus signalling of the HM5065 parallel output.
pub const BUS_CONFIG: BusConfig = BusConfig {
    master: true,
    vsync_active_high: false,
    hsync_active_high: true,
    pclk_rising_edge: true,
};

// Capture (still) modes

static QSXGA_REGS: [RegisterOp; 9] = [
    RegisterOp::w(0x0010, 0x02),
    RegisterOp::w(0x00ED, 0x05),
    RegisterOp::w(0x7000, 0x08),
    RegisterOp::w(0x5200, 0x09),
    RegisterOp::w(0x0030, 0x12),
    RegisterOp::w(0x0040, 0x00),
    RegisterOp::w(0x0041, 0x00),
    RegisterOp::w(0x00B4, 0x01),
    RegisterOp::w(0x0010, 0x01),
];

static UXGA_REGS: [RegisterOp; 9] = [
    RegisterOp::w(0x0010, 0x02),
    RegisterOp::w(0x7000, 0x08),
    RegisterOp::w(0x5200, 0x09),
    RegisterOp::w(0x00ED, 0x05),
    RegisterOp::w(0x0030, 0x12),
    RegisterOp::w(0x0040, 0x00),
    RegisterOp::w(0x0041, 0x01),
    RegisterOp::w(0x00B4, 0x01),
    RegisterOp::w(0x0010, 0x01),
];

static SXGA_REGS: [RegisterOp; 9] = [
    RegisterOp::w(0x0010, 0x02),
    RegisterOp::w(0x7000, 0x08),
    RegisterOp::w(0x5200, 0x09),
    RegisterOp::w(0x00ED, 0x05),
    RegisterOp::w(0x0030, 0x12),
    RegisterOp::w(0x0040, 0x00),
    RegisterOp::w(0x0041, 0x02),
    RegisterOp::w(0x00B4, 0x01),
    RegisterOp::w(0x0010, 0x01),
];

static XGA_REGS: [RegisterOp; 13] = [
    RegisterOp::w(0x0010, 0x02),
    RegisterOp::w(0x7000, 0x08),
    RegisterOp::w(0x5200, 0x09),
    RegisterOp::w(0x00ED, 0x05),
    RegisterOp::w(0x0030, 0x12),
    RegisterOp::w(0x0040, 0x01),
    RegisterOp::w(0x0041, 0x0A),
    RegisterOp::w(0x0042, 0x04),
    RegisterOp::w(0x0043, 0x00),
    RegisterOp::w(0x0044, 0x03),
    RegisterOp::w(0x0045, 0x00),
    RegisterOp::w(0x00B4, 0x01),
    RegisterOp::w(0x0010, 0x01),
];

// Video modes

static HD1080_REGS: [RegisterOp; 12] = [
    RegisterOp::w(0x0010, 0x02),
    RegisterOp::w(0x7000, 0x08),
    RegisterOp::w(0x5200, 0x09),
    RegisterOp::w(0x0030, 0x12),
    RegisterOp::w(0x0040, 0x01),
    RegisterOp::w(0x0041, 0x0A),
    RegisterOp::w(0x0042, 0x07),
    RegisterOp::w(0x0043, 0x80),
    RegisterOp::w(0x0044, 0x04),
    RegisterOp::w(0x0045, 0x38),
    RegisterOp::w(0x00B4, 0x01),
    RegisterOp::w(0x0010, 0x01),
];

static HD720_REGS: [RegisterOp; 13] = [
    RegisterOp::w(0x0010, 0x02),
    RegisterOp::w(0x7000, 0x08),
    RegisterOp::w(0x00ED, 0x0A),
    RegisterOp::w(0x5200, 0x09),
    RegisterOp::w(0x0030, 0x12),
    RegisterOp::w(0x0040, 0x01),
    RegisterOp::w(0x0041, 0x0A),
    RegisterOp::w(0x0042, 0x05),
    RegisterOp::w(0x0043, 0x00),
    RegisterOp::w(0x0044, 0x02),
    RegisterOp::w(0x0045, 0xD0),
    RegisterOp::w(0x00B4, 0x01),
    RegisterOp::w(0x0010, 0x01),
];

static SVGA_REGS: [RegisterOp; 9] = [
    RegisterOp::w(0x0010, 0x02),
    RegisterOp::w(0x7000, 0x08),
    RegisterOp::w(0x5200, 0x09),
    RegisterOp::w(0x00ED, 0x0A),
    RegisterOp::w(0x0030, 0x12),
    RegisterOp::w(0x0040, 0x00),
    RegisterOp::w(0x0041, 0x03),
    RegisterOp::w(0x00B4, 0x01),
    RegisterOp::w(0x0010, 0x01),
];

// VGA is switched without powering the pipeline down
static VGA_REGS: [RegisterOp; 7] = [
    RegisterOp::w(0x7000, 0x08),
    RegisterOp::w(0x5200, 0x09),
    RegisterOp::w(0x00ED, 0x0A),
    RegisterOp::w(0x0030, 0x12),
    RegisterOp::w(0x0040, 0x01),
    RegisterOp::w(0x0041, 0x04),
    RegisterOp::w(0x00B4, 0x01),
];

/// Mode table in negotiation order, roughly largest first. 1080p is scanned before UXGA.
pub static MODES: [Mode; 8] = [
    Mode { width: 2592, height: 1936, program: &QSXGA_REGS },
    Mode { width: 1920, height: 1080, program: &HD1080_REGS },
    Mode { width: 1600, height: 1200, program: &UXGA_REGS },
    Mode { width: 1280, height: 1024, program: &SXGA_REGS },
    Mode { width: 1280, height: 720, program: &HD720_REGS },
    Mode { width: 1024, height: 768, program: &XGA_REGS },
    Mode { width: 800, height: 600, program: &SVGA_REGS },
    Mode { width: 640, height: 480, program: &VGA_REGS },
];

/// Supported output formats, all YUV 4:2:2.
pub static FORMATS: [FormatDescriptor; 4] = [
    FormatDescriptor {
        description: "YUYV 4:2:2",
        pixel_layout: PixelLayout::Yuyv,
        program: &regs::FMT_YUYV_REGS,
        bytes_per_pixel: 2,
    },
    FormatDescriptor {
        description: "YVYU 4:2:2",
        pixel_layout: PixelLayout::Yvyu,
        program: &regs::FMT_YVYU_REGS,
        bytes_per_pixel: 2,
    },
    FormatDescriptor {
        description: "UYVY 4:2:2",
        pixel_layout: PixelLayout::Uyvy,
        program: &regs::FMT_UYVY_REGS,
        bytes_per_pixel: 2,
    },
    FormatDescriptor {
        description: "VYUY 4:2:2",
        pixel_layout: PixelLayout::Vyuy,
        program: &regs::FMT_VYUY_REGS,
        bytes_per_pixel: 2,
    },
];

/// Round the requested size down to the nearest supported mode, but not below the smallest.
pub fn negotiate(width: u32, height: u32) -> (NegotiatedSize, &'static Mode) {
    let mode = MODES
        .iter()
        .find(|mode| width >= mode.width && height >= mode.height)
        .unwrap_or(&MODES[MODES.len() - 1]);

    let size = NegotiatedSize {
        width: mode.width,
        height: mode.height,
        field: Field::Progressive,
    };
    (size, mode)
}

/// Look up the format descriptor for a pixel layout.
pub fn format(layout: PixelLayout) -> &'static FormatDescriptor {
    match layout {
        PixelLayout::Yuyv => &FORMATS[0],
        PixelLayout::Yvyu => &FORMATS[1],
        PixelLayout::Uyvy => &FORMATS[2],
        PixelLayout::Vyuy => &FORMATS[3],
    }
}

/// Enumerate modes by stable index.
pub fn mode(index: usize) -> Option<&'static Mode> {
    MODES.get(index)
}

/// Enumerate formats by stable index.
pub fn format_at(index: usize) -> Option<&'static FormatDescriptor> {
    FORMATS.get(index)
}
