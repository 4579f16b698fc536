use thiserror::Error;

/// Fatal emulation failures.
#[derive(Debug, Error)]
pub enum EmuError {
    /// The CPU decoded an opcode with no defined behaviour.
    #[error("unimplemented opcode 0x{opcode:02X} at PC=0x{pc:04X}")]
    UnimplementedOpcode { opcode: u8, pc: u16 },
}

/// Failures while building or persisting a cartridge.
#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("ROM image is {0} bytes, too short to hold a cartridge header")]
    Truncated(usize),
    #[error("header checksum mismatch: header says 0x{expected:02X}, computed 0x{computed:02X}")]
    HeaderChecksum { expected: u8, computed: u8 },
    #[error("unsupported cartridge type 0x{0:02X}")]
    Unsupported(u8),
    #[error("battery file I/O failed")]
    Io(#[from] std::io::Error),
}
