use dotmatrix_common::channel::{frame_channel, input_channel};
use dotmatrix_common::key::{Button, KeyEvent};

use super::lcd::{LcdMode, LCDC, LY};
use super::timer::{DIV, TAC, TIMA, TMA};
use super::{GameBoy, Interrupt, OAM_DMA_LEN};
use crate::cpu::Bus;
use crate::error::EmuError;
use crate::MCYCLES_PER_FRAME;

/// A ROM-only machine with `program` at the entry point.
fn machine_with(program: &[u8]) -> GameBoy {
    let mut rom = vec![0u8; 0x8000];
    rom[0x100..0x100 + program.len()].copy_from_slice(program);
    let mut gb = GameBoy::new();
    gb.load_rom(&rom);
    gb
}

const JR_SELF: [u8; 2] = [0x18, 0xFE];

#[test]
fn jr_to_itself_costs_three_cycles() {
    let mut gb = machine_with(&JR_SELF);
    assert_eq!(gb.step().unwrap(), 3);
    assert_eq!(gb.cpu.regs.pc, 0x0100);
    assert_eq!(gb.bus.cycles(), 3);
}

#[test]
fn unimplemented_opcode_is_fatal() {
    let mut gb = machine_with(&[0xD3]);
    match gb.step() {
        Err(EmuError::UnimplementedOpcode { opcode, pc }) => {
            assert_eq!(opcode, 0xD3);
            assert_eq!(pc, 0x0100);
        }
        other => panic!("expected an unimplemented opcode error, got {other:?}"),
    }
}

#[test]
fn oam_dma_copies_160_bytes_after_start_delay() {
    // LD A,0xC1 ; LDH (0x46),A ; JR -2
    let mut gb = machine_with(&[0x3E, 0xC1, 0xE0, 0x46, 0x18, 0xFE]);
    for i in 0..OAM_DMA_LEN as u16 {
        gb.bus.write8(0xC100 + i, i as u8 ^ 0x5A);
    }

    gb.step().unwrap();
    gb.step().unwrap();
    let started = gb.bus.cycles();
    assert!(gb.bus.dma().is_active());
    assert_eq!(gb.bus.read8(0xFE00), 0xFF, "OAM is locked during DMA");
    assert_eq!(gb.bus.read8(0xFF46), 0xC1);

    gb.bus.write8(0xFE10, 0x99);

    // LDH's own 3 cycles covered the 2-cycle delay and the first byte.
    assert_eq!(gb.bus.ppu().read_oam(0), 0x5A);
    for copied in 1..OAM_DMA_LEN {
        assert!(gb.bus.dma().is_active(), "DMA ended after {copied} bytes");
        gb.bus.advance(1);
    }
    assert!(!gb.bus.dma().is_active());
    assert_eq!(gb.bus.cycles() - started, OAM_DMA_LEN as u64 - 1);

    for i in 0..OAM_DMA_LEN as u16 {
        assert_eq!(gb.bus.read8(0xFE00 + i), i as u8 ^ 0x5A, "OAM byte {i}");
    }
}

#[test]
fn highest_priority_interrupt_is_serviced_first() {
    let mut gb = machine_with(&[0x00]);
    gb.bus.write8(0xFFFF, 0x1F);
    gb.bus.write8(0xFF0F, (Interrupt::VBLANK | Interrupt::TIMER).bits());
    gb.cpu.ime = true;

    assert_eq!(gb.step().unwrap(), 1 + 5);
    assert_eq!(gb.cpu.regs.pc, 0x0040);
    assert!(!gb.cpu.ime);
    assert_eq!(gb.bus.read8(0xFF0F) & 0x1F, Interrupt::TIMER.bits());
    assert_eq!(gb.cpu.regs.sp, 0xFFFC);
    assert_eq!(gb.bus.read16(0xFFFC), 0x0101);
}

#[test]
fn ei_enables_after_the_next_instruction() {
    // EI ; NOP ; NOP
    let mut gb = machine_with(&[0xFB, 0x00, 0x00]);
    gb.bus.write8(0xFFFF, Interrupt::VBLANK.bits());
    gb.bus.write8(0xFF0F, Interrupt::VBLANK.bits());

    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.pc, 0x0101, "no dispatch right after EI");

    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.pc, 0x0040);
    assert_eq!(gb.bus.read16(gb.cpu.regs.sp), 0x0102);
}

#[test]
fn halt_wakes_on_request_even_when_disabled() {
    // HALT ; INC A
    let mut gb = machine_with(&[0x76, 0x3C]);
    gb.step().unwrap();
    assert!(gb.cpu.halted);
    assert_eq!(gb.step().unwrap(), 1);
    assert!(gb.cpu.halted);

    gb.bus.interrupts().request(Interrupt::TIMER);
    gb.step().unwrap();
    assert!(!gb.cpu.halted);
    assert_eq!(gb.cpu.regs.pc, 0x0101, "no dispatch with IME and IE clear");

    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.a, 0x02);
}

#[test]
fn timer_overflow_reloads_and_requests_interrupt() {
    let mut gb = machine_with(&JR_SELF);
    gb.bus.write8(DIV, 0);
    gb.bus.write8(TMA, 0x10);
    gb.bus.write8(TIMA, 0xFE);
    gb.bus.write8(TAC, 0x05);

    gb.bus.advance(8);
    assert_eq!(gb.bus.read8(TIMA), 0x10);
    assert!(gb.bus.interrupts().requested().contains(Interrupt::TIMER));
}

#[test]
fn memory_map_sentinels() {
    let mut gb = machine_with(&JR_SELF);

    gb.bus.write8(0xC000, 0x12);
    gb.bus.write8(0xE000, 0x34);
    assert_eq!(gb.bus.read8(0xE000), 0x00);
    assert_eq!(gb.bus.read8(0xC000), 0x12, "echo writes are dropped");

    gb.bus.write8(0xFEA0, 0x56);
    assert_eq!(gb.bus.read8(0xFEA0), 0xFF);
    assert_eq!(gb.bus.read8(0xFEFF), 0xFF);

    gb.bus.write8(0xFF26, 0x42);
    assert_eq!(gb.bus.read8(0xFF26), 0x42, "unmapped I/O reads back");

    gb.bus.write8(0xFF80, 0x77);
    gb.bus.write8(0xFFFE, 0x88);
    assert_eq!(gb.bus.read8(0xFF80), 0x77);
    assert_eq!(gb.bus.read8(0xFFFE), 0x88);

    gb.bus.write8(LY, 0x33);
    assert_eq!(gb.bus.read8(LY), 0);
}

#[test]
fn boot_register_values() {
    let mut gb = GameBoy::new();
    assert_eq!(gb.bus.read8(LCDC), 0x91);
    assert_eq!(gb.bus.read8(0xFF47), 0xFC);
    assert_eq!(gb.bus.read8(0xFF0F) & 0x1F, 0);
    assert_eq!(gb.bus.read8(0xFFFF), 0);
    assert_eq!(gb.bus.read8(DIV), 0xAB);
    assert_eq!(gb.cpu.regs.pc, 0x0100);
}

#[test]
fn serial_transfer_lands_in_output() {
    // LD A,'H' ; LDH (0x01),A ; LD A,0x81 ; LDH (0x02),A ; JR -2
    let mut gb = machine_with(&[0x3E, b'H', 0xE0, 0x01, 0x3E, 0x81, 0xE0, 0x02, 0x18, 0xFE]);
    for _ in 0..4 {
        gb.step().unwrap();
    }
    assert_eq!(gb.serial_output(), b"H");
    assert!(gb.bus.interrupts().requested().contains(Interrupt::SERIAL));
}

#[test]
fn completed_frames_go_through_the_channel() {
    let (tx, rx) = frame_channel();
    let mut gb = machine_with(&JR_SELF);
    gb.attach_frame_sender(tx);

    gb.step_frame().unwrap();
    assert_eq!(gb.frame_count(), 1);
    let frame = rx.try_recv().expect("one frame queued");
    assert_eq!(&frame, gb.frame());
    assert!(rx.try_recv().is_none());
}

#[test]
fn dropped_frame_consumer_does_not_stall() {
    let (tx, rx) = frame_channel();
    drop(rx);
    let mut gb = machine_with(&JR_SELF);
    gb.attach_frame_sender(tx);

    gb.step_frame().unwrap();
    gb.step_frame().unwrap();
    assert_eq!(gb.frame_count(), 2);
}

#[test]
fn lcd_off_frame_is_bounded_by_cycles() {
    let mut gb = machine_with(&JR_SELF);
    gb.bus.write8(LCDC, 0x11);
    assert_eq!(gb.bus.ppu().mode(), LcdMode::HBlank);

    gb.step_frame().unwrap();
    assert_eq!(gb.frame_count(), 0);
    assert!(gb.bus.cycles() >= MCYCLES_PER_FRAME as u64);
    assert_eq!(gb.bus.read8(LY), 0);
}

#[test]
fn input_events_are_polled_per_instruction() {
    let (tx, rx) = input_channel();
    let mut gb = machine_with(&JR_SELF);
    gb.attach_input_receiver(rx);
    gb.bus.write8(0xFF00, 0x10);

    tx.send(KeyEvent::down(Button::Start)).unwrap();
    gb.step().unwrap();
    assert_eq!(gb.bus.read8(0xFF00) & 0x0F, 0x07);
    assert!(gb.bus.interrupts().requested().contains(Interrupt::JOYPAD));

    tx.send(KeyEvent::up(Button::Start)).unwrap();
    gb.step().unwrap();
    assert_eq!(gb.bus.read8(0xFF00) & 0x0F, 0x0F);

    drop(tx);
    gb.step().unwrap();
}

#[test]
fn snapshot_restores_machine_state() {
    // INC A ; JR -3
    let mut gb = machine_with(&[0x3C, 0x18, 0xFD]);
    for _ in 0..10 {
        gb.step().unwrap();
    }
    gb.bus.write8(0xC000, 0xAA);
    let snapshot = gb.snapshot();
    let a = gb.cpu.regs.a;
    let cycles = gb.bus.cycles();

    for _ in 0..1000 {
        gb.step().unwrap();
    }
    gb.bus.write8(0xC000, 0xBB);
    assert_ne!(gb.bus.cycles(), cycles);

    gb.restore(&snapshot);
    assert_eq!(gb.cpu.regs.a, a);
    assert_eq!(gb.bus.cycles(), cycles);
    assert_eq!(snapshot.cycles(), cycles);
    assert_eq!(gb.bus.read8(0xC000), 0xAA);
}

#[test]
fn reset_keeps_the_cartridge() {
    let mut gb = machine_with(&[0x3C, 0x18, 0xFD]);
    for _ in 0..5 {
        gb.step().unwrap();
    }
    gb.reset();
    assert_eq!(gb.cpu.regs.pc, 0x0100);
    assert_eq!(gb.bus.cycles(), 0);
    assert_eq!(gb.bus.read8(0x0100), 0x3C);
}
