//! S1D15G10 command set.

use display_interface::{DataFormat::U8, DisplayError, WriteOnlyDataCommand};
use heapless::Vec;

/// Controller opcodes.
pub mod opcode {
    pub const DISON: u8 = 0xAF;
    pub const DISOFF: u8 = 0xAE;
    pub const DISNOR: u8 = 0xA6;
    pub const DISINV: u8 = 0xA7;
    pub const COMSCN: u8 = 0xBB;
    pub const DISCTL: u8 = 0xCA;
    pub const SLPIN: u8 = 0x95;
    pub const SLPOUT: u8 = 0x94;
    pub const PASET: u8 = 0x75;
    pub const CASET: u8 = 0x15;
    pub const DATCTL: u8 = 0xBC;
    pub const RAMWR: u8 = 0x5C;
    pub const PTLIN: u8 = 0xA8;
    pub const PTLOUT: u8 = 0xA9;
    pub const ASCSET: u8 = 0xAA;
    pub const SCSTART: u8 = 0xAB;
    pub const OSCON: u8 = 0xD1;
    pub const OSCOFF: u8 = 0xD2;
    pub const PWRCTR: u8 = 0x20;
    pub const VOLCTR: u8 = 0x81;
    pub const VOLUP: u8 = 0xD6;
    pub const VOLDOWN: u8 = 0xD7;
    pub const NOP: u8 = 0x25;
}

/// A controller command together with its parameter bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Turn the panel on (true) or off (false)
    DisplayOn(bool),
    /// Inverse (true) or normal (false) display
    Invert(bool),
    /// Clock division, duty, inversion lines, dispersion
    DisplayControl(u8, u8, u8, u8),
    /// Common output scan direction
    ComScan(u8),
    OscillatorOn,
    OscillatorOff,
    SleepIn,
    SleepOut,
    /// Power control circuits to enable (booster, regulators, follower)
    PowerControl(u8),
    /// Electronic volume and internal resistor ratio
    Volume(u8, u8),
    VolumeUp,
    VolumeDown,
    /// Page (x) address window, start and end inclusive
    PageAddress(u8, u8),
    /// Column (y) address window, start and end inclusive
    ColumnAddress(u8, u8),
    /// Scan direction, RGB arrangement, grayscale setup
    DataControl(u8, u8, u8),
    /// Begin a memory write; everything that follows is pixel data
    MemoryWrite,
    /// Partial display between two lines
    PartialIn(u8, u8),
    PartialOut,
    /// Area scroll top, bottom, number of blocks and type
    ScrollArea(u8, u8, u8, u8),
    /// First block of the scroll area
    ScrollStart(u8),
    Nop,
}

impl Command {
    fn encode(self) -> (u8, Vec<u8, 4>) {
        let mut params = Vec::new();
        let op = match self {
            Command::DisplayOn(true) => opcode::DISON,
            Command::DisplayOn(false) => opcode::DISOFF,
            Command::Invert(true) => opcode::DISINV,
            Command::Invert(false) => opcode::DISNOR,
            Command::DisplayControl(a, b, c, d) => {
                fill(&mut params, &[a, b, c, d]);
                opcode::DISCTL
            }
            Command::ComScan(dir) => {
                fill(&mut params, &[dir]);
                opcode::COMSCN
            }
            Command::OscillatorOn => opcode::OSCON,
            Command::OscillatorOff => opcode::OSCOFF,
            Command::SleepIn => opcode::SLPIN,
            Command::SleepOut => opcode::SLPOUT,
            Command::PowerControl(circuits) => {
                fill(&mut params, &[circuits]);
                opcode::PWRCTR
            }
            Command::Volume(volume, resistor) => {
                fill(&mut params, &[volume, resistor]);
                opcode::VOLCTR
            }
            Command::VolumeUp => opcode::VOLUP,
            Command::VolumeDown => opcode::VOLDOWN,
            Command::PageAddress(start, end) => {
                fill(&mut params, &[start, end]);
                opcode::PASET
            }
            Command::ColumnAddress(start, end) => {
                fill(&mut params, &[start, end]);
                opcode::CASET
            }
            Command::DataControl(scan, rgb, gray) => {
                fill(&mut params, &[scan, rgb, gray]);
                opcode::DATCTL
            }
            Command::MemoryWrite => opcode::RAMWR,
            Command::PartialIn(start, end) => {
                fill(&mut params, &[start, end]);
                opcode::PTLIN
            }
            Command::PartialOut => opcode::PTLOUT,
            Command::ScrollArea(top, bottom, blocks, kind) => {
                fill(&mut params, &[top, bottom, blocks, kind]);
                opcode::ASCSET
            }
            Command::ScrollStart(block) => {
                fill(&mut params, &[block]);
                opcode::SCSTART
            }
            Command::Nop => opcode::NOP,
        };
        (op, params)
    }

    /// Send the opcode with the command tag, then any parameters as data.
    pub fn send<DI>(self, iface: &mut DI) -> Result<(), DisplayError>
    where
        DI: WriteOnlyDataCommand,
    {
        let (op, params) = self.encode();
        iface.send_commands(U8(&[op]))?;
        if !params.is_empty() {
            iface.send_data(U8(&params))?;
        }
        Ok(())
    }
}

fn fill(params: &mut Vec<u8, 4>, bytes: &[u8]) {
    let fits = params.extend_from_slice(bytes);
    debug_assert!(fits.is_ok(), "more than four command parameters");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Panel, Transfer};
    use std::vec;

    #[test]
    fn opcode_goes_first_then_parameters() {
        let mut panel = Panel::new();
        Command::PageAddress(3, 9).send(&mut panel).unwrap();
        Command::MemoryWrite.send(&mut panel).unwrap();

        assert_eq!(
            panel.transfers(),
            vec![
                Transfer::Command(0x75),
                Transfer::Data(3),
                Transfer::Data(9),
                Transfer::Command(0x5C),
            ]
        );
    }

    #[test]
    fn opcodes_match_the_controller() {
        let cases = [
            (Command::DisplayOn(true), 0xAF),
            (Command::DisplayOn(false), 0xAE),
            (Command::Invert(true), 0xA7),
            (Command::Invert(false), 0xA6),
            (Command::DisplayControl(0, 0x20, 0x0C, 0), 0xCA),
            (Command::ComScan(1), 0xBB),
            (Command::OscillatorOn, 0xD1),
            (Command::SleepOut, 0x94),
            (Command::SleepIn, 0x95),
            (Command::PowerControl(0x0F), 0x20),
            (Command::Volume(0x24, 3), 0x81),
            (Command::VolumeUp, 0xD6),
            (Command::VolumeDown, 0xD7),
            (Command::ColumnAddress(0, 131), 0x15),
            (Command::DataControl(1, 0, 2), 0xBC),
            (Command::Nop, 0x25),
        ];
        for (cmd, op) in cases.iter() {
            assert_eq!(cmd.encode().0, *op, "{:?}", cmd);
        }
        assert_eq!(&Command::DisplayControl(0, 0x20, 0x0C, 0).encode().1[..], &[0, 0x20, 0x0C, 0]);
    }

    #[test]
    fn every_parameter_is_kept() {
        let cases: [(Command, &[u8]); 6] = [
            (Command::ScrollArea(1, 2, 3, 4), &[1, 2, 3, 4]),
            (Command::DataControl(1, 0, 2), &[1, 0, 2]),
            (Command::PartialIn(10, 20), &[10, 20]),
            (Command::ScrollStart(7), &[7]),
            (Command::PartialOut, &[]),
            (Command::MemoryWrite, &[]),
        ];
        for (cmd, params) in cases.iter() {
            let mut panel = Panel::new();
            cmd.send(&mut panel).unwrap();

            let (op, _) = cmd.encode();
            assert_eq!(panel.data_after(op), params.to_vec(), "{:?}", cmd);
            assert_eq!(panel.transfers().len(), 1 + params.len());
        }
    }
}
