//! Binary encode/decode for the demo format.
//!
//! All integers are little-endian. The format is intentionally simple: no
//! compression, no alignment padding, no self-describing schema. Frames
//! only carry the columns of participants present in that step, and only
//! the command fields a replay needs (movement, turn, buttons).

use std::io::{ErrorKind, Read, Write};

use ticloop_core::{ParticipantId, TicCmd, TicSet, MAX_PARTICIPANTS};
use ticloop_engine::SyncMode;

use crate::error::ReplayError;
use crate::types::{DemoFlags, DemoFrame, DemoHeader};
use crate::{FORMAT_VERSION, MAGIC};

// ── Primitive writers ───────────────────────────────────────────

/// Write a single byte.
pub fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), ReplayError> {
    w.write_all(&[v])?;
    Ok(())
}

/// Write a little-endian u16.
pub fn write_u16_le(w: &mut dyn Write, v: u16) -> Result<(), ReplayError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u32.
pub fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), ReplayError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u64.
pub fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), ReplayError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

/// Read a single byte.
pub fn read_u8(r: &mut dyn Read) -> Result<u8, ReplayError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a little-endian u16.
pub fn read_u16_le(r: &mut dyn Read) -> Result<u16, ReplayError> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

/// Read a little-endian u32.
pub fn read_u32_le(r: &mut dyn Read) -> Result<u32, ReplayError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read a little-endian u64.
pub fn read_u64_le(r: &mut dyn Read) -> Result<u64, ReplayError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_bool(r: &mut dyn Read, what: &str) -> Result<bool, ReplayError> {
    match read_u8(r)? {
        0 => Ok(false),
        1 => Ok(true),
        v => Err(ReplayError::MalformedHeader {
            detail: format!("invalid {what} flag: {v}"),
        }),
    }
}

// ── Header encode/decode ────────────────────────────────────────

fn sync_mode_tag(mode: SyncMode) -> u8 {
    match mode {
        SyncMode::FixedAvailability => 0,
        SyncMode::Adaptive => 1,
    }
}

/// Encode the demo header (magic, version, session parameters, flags).
pub fn encode_header(w: &mut dyn Write, header: &DemoHeader) -> Result<(), ReplayError> {
    w.write_all(&MAGIC)?;
    write_u8(w, FORMAT_VERSION)?;

    write_u8(w, header.participants)?;
    write_u8(w, header.local.0)?;
    write_u32_le(w, header.ticdup)?;
    write_u8(w, sync_mode_tag(header.sync_mode))?;
    write_u8(w, u8::from(header.drone))?;
    write_u8(w, header.player_class)?;
    write_u8(w, header.flags.bits())?;
    Ok(())
}

/// Decode and validate the demo header.
pub fn decode_header(r: &mut dyn Read) -> Result<DemoHeader, ReplayError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(ReplayError::InvalidMagic);
    }

    let version = read_u8(r)?;
    if version != FORMAT_VERSION {
        return Err(ReplayError::UnsupportedVersion { found: version });
    }

    let participants = read_u8(r)?;
    let local = ParticipantId(read_u8(r)?);
    let ticdup = read_u32_le(r)?;
    let sync_mode = match read_u8(r)? {
        0 => SyncMode::FixedAvailability,
        1 => SyncMode::Adaptive,
        tag => {
            return Err(ReplayError::MalformedHeader {
                detail: format!("unknown sync mode tag {tag}"),
            })
        }
    };
    let drone = read_bool(r, "drone")?;
    let player_class = read_u8(r)?;
    let bits = read_u8(r)?;
    let flags = DemoFlags::from_bits(bits).ok_or_else(|| ReplayError::MalformedHeader {
        detail: format!("unknown extension bits {bits:#04x}"),
    })?;

    let header = DemoHeader {
        participants,
        local,
        ticdup,
        sync_mode,
        drone,
        player_class,
        flags,
    };
    header
        .to_settings()
        .validate()
        .map_err(|e| ReplayError::MalformedHeader {
            detail: e.to_string(),
        })?;
    Ok(header)
}

// ── Command encode/decode ───────────────────────────────────────

/// The command as playback will see it.
///
/// Without long tics only the high byte of the turn delta survives, and
/// the fields a demo does not carry (chat, consistency) are dropped.
pub fn quantize(cmd: &TicCmd, long_tics: bool) -> TicCmd {
    let angle_turn = if long_tics {
        cmd.angle_turn
    } else {
        ((cmd.angle_turn as u16) & 0xff00) as i16
    };
    TicCmd {
        forward_move: cmd.forward_move,
        side_move: cmd.side_move,
        angle_turn,
        buttons: cmd.buttons,
        ..TicCmd::default()
    }
}

/// A tic set as playback will see it: present columns quantized,
/// absent columns cleared.
pub fn quantize_set(set: &TicSet, long_tics: bool) -> TicSet {
    let mut out = TicSet {
        present: set.present,
        ..TicSet::default()
    };
    for (dst, (src, &here)) in out
        .commands
        .iter_mut()
        .zip(set.commands.iter().zip(&set.present))
    {
        if here {
            *dst = quantize(src, long_tics);
        }
    }
    out
}

/// Encode one participant's command.
pub fn encode_command(w: &mut dyn Write, cmd: &TicCmd, long_tics: bool) -> Result<(), ReplayError> {
    write_u8(w, cmd.forward_move as u8)?;
    write_u8(w, cmd.side_move as u8)?;
    if long_tics {
        write_u16_le(w, cmd.angle_turn as u16)?;
    } else {
        write_u8(w, ((cmd.angle_turn as u16) >> 8) as u8)?;
    }
    write_u8(w, cmd.buttons)?;
    Ok(())
}

/// Decode one participant's command.
pub fn decode_command(r: &mut dyn Read, long_tics: bool) -> Result<TicCmd, ReplayError> {
    let forward_move = read_u8(r)? as i8;
    let side_move = read_u8(r)? as i8;
    let angle_turn = if long_tics {
        read_u16_le(r)? as i16
    } else {
        (u16::from(read_u8(r)?) << 8) as i16
    };
    let buttons = read_u8(r)?;
    Ok(TicCmd {
        forward_move,
        side_move,
        angle_turn,
        buttons,
        ..TicCmd::default()
    })
}

// ── Frame encode/decode ─────────────────────────────────────────

/// Encode a single demo frame.
///
/// The frame must carry a digest exactly when `flags` says the demo
/// records them.
pub fn encode_frame(
    w: &mut dyn Write,
    frame: &DemoFrame,
    flags: DemoFlags,
) -> Result<(), ReplayError> {
    let digests = flags.contains(DemoFlags::DIGESTS);
    if frame.digest.is_some() != digests {
        return Err(ReplayError::MalformedFrame {
            detail: format!(
                "frame {} digest presence does not match the header (digests: {digests})",
                frame.tic
            ),
        });
    }

    let long_tics = flags.contains(DemoFlags::LONG_TICS);
    write_u64_le(w, frame.tic)?;
    write_u8(w, frame.set.present_mask())?;
    for (cmd, &here) in frame.set.commands.iter().zip(&frame.set.present) {
        if here {
            encode_command(w, cmd, long_tics)?;
        }
    }
    if let Some(digest) = frame.digest {
        write_u64_le(w, digest)?;
    }
    Ok(())
}

/// Decode a single demo frame.
///
/// Returns `Ok(None)` on clean EOF (no bytes available), `Ok(Some(frame))`
/// on success, or an error on truncated/corrupt data.
pub fn decode_frame(r: &mut dyn Read, flags: DemoFlags) -> Result<Option<DemoFrame>, ReplayError> {
    // Read the tic header byte-by-byte to distinguish clean EOF
    // (zero bytes available) from truncation (1-7 bytes before EOF).
    let mut tic_buf = [0u8; 8];
    let mut filled = 0;
    while filled < 8 {
        match r.read(&mut tic_buf[filled..]) {
            Ok(0) => {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(ReplayError::MalformedFrame {
                    detail: format!("truncated frame header: got {filled} of 8 bytes for tic"),
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(ReplayError::Io(e)),
        }
    }
    let tic = u64::from_le_bytes(tic_buf);

    let long_tics = flags.contains(DemoFlags::LONG_TICS);
    let mask = read_u8(r)?;
    let mut set = TicSet::default();
    for i in 0..MAX_PARTICIPANTS {
        if mask & (1 << i) != 0 {
            set.present[i] = true;
            set.commands[i] = decode_command(r, long_tics)?;
        }
    }

    let digest = if flags.contains(DemoFlags::DIGESTS) {
        Some(read_u64_le(r)?)
    } else {
        None
    };

    Ok(Some(DemoFrame { tic, set, digest }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use ticloop_core::Buttons;

    fn header(flags: DemoFlags) -> DemoHeader {
        DemoHeader {
            participants: 4,
            local: ParticipantId(1),
            ticdup: 2,
            sync_mode: SyncMode::Adaptive,
            drone: false,
            player_class: 3,
            flags,
        }
    }

    fn cmd(angle_turn: i16) -> TicCmd {
        TicCmd {
            forward_move: -25,
            side_move: 40,
            angle_turn,
            buttons: Buttons::ATTACK,
            chat_char: b'q',
            consistency: 77,
        }
    }

    #[test]
    fn header_roundtrip() {
        let h = header(DemoFlags::LONG_TICS);
        let mut buf = Vec::new();
        encode_header(&mut buf, &h).unwrap();
        assert_eq!(&buf[..4], &MAGIC);
        assert_eq!(decode_header(&mut buf.as_slice()).unwrap(), h);
    }

    #[test]
    fn bad_magic() {
        let data = b"XICL\x01rest";
        assert!(matches!(
            decode_header(&mut data.as_slice()),
            Err(ReplayError::InvalidMagic)
        ));
    }

    #[test]
    fn wrong_version() {
        let mut data = MAGIC.to_vec();
        data.push(FORMAT_VERSION + 1);
        assert!(matches!(
            decode_header(&mut data.as_slice()),
            Err(ReplayError::UnsupportedVersion { found }) if found == FORMAT_VERSION + 1
        ));
    }

    #[test]
    fn impossible_session_is_rejected() {
        let mut h = header(DemoFlags::empty());
        h.local = ParticipantId(6);
        let mut buf = Vec::new();
        encode_header(&mut buf, &h).unwrap();
        assert!(matches!(
            decode_header(&mut buf.as_slice()),
            Err(ReplayError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn unknown_flags_are_rejected() {
        let mut buf = Vec::new();
        encode_header(&mut buf, &header(DemoFlags::empty())).unwrap();
        let last = buf.len() - 1;
        buf[last] = 0x80;
        assert!(matches!(
            decode_header(&mut buf.as_slice()),
            Err(ReplayError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn vanilla_keeps_only_the_turn_high_byte() {
        let mut buf = Vec::new();
        encode_command(&mut buf, &cmd(0x1234), false).unwrap();
        assert_eq!(buf.len(), 4);
        let back = decode_command(&mut buf.as_slice(), false).unwrap();
        assert_eq!(back.angle_turn, 0x1200);
        assert_eq!(back, quantize(&cmd(0x1234), false));
    }

    #[test]
    fn negative_turns_survive_vanilla_quantization() {
        let q = quantize(&cmd(-300), false);
        assert_eq!(q.angle_turn, -512);
        let mut buf = Vec::new();
        encode_command(&mut buf, &cmd(-300), false).unwrap();
        assert_eq!(decode_command(&mut buf.as_slice(), false).unwrap(), q);
    }

    #[test]
    fn long_tics_keep_the_full_turn() {
        let mut buf = Vec::new();
        encode_command(&mut buf, &cmd(-12345), true).unwrap();
        assert_eq!(buf.len(), 5);
        let back = decode_command(&mut buf.as_slice(), true).unwrap();
        assert_eq!(back.angle_turn, -12345);
        assert_eq!(back.chat_char, 0);
        assert_eq!(back.consistency, 0);
    }

    #[test]
    fn frame_stores_only_present_columns() {
        let mut set = TicSet::default();
        set.present[0] = true;
        set.present[3] = true;
        set.commands[3] = cmd(0x0100);
        let frame = DemoFrame {
            tic: 9,
            set,
            digest: None,
        };

        let mut buf = Vec::new();
        encode_frame(&mut buf, &frame, DemoFlags::empty()).unwrap();
        assert_eq!(buf.len(), 8 + 1 + 2 * 4);

        let back = decode_frame(&mut buf.as_slice(), DemoFlags::empty())
            .unwrap()
            .unwrap();
        assert_eq!(back.tic, 9);
        assert_eq!(back.set.present_mask(), 0b1001);
        assert_eq!(back.set.commands[3], quantize(&cmd(0x0100), false));
    }

    #[test]
    fn digest_presence_must_match_flags() {
        let frame = DemoFrame {
            tic: 0,
            set: TicSet::default(),
            digest: Some(1),
        };
        let mut buf = Vec::new();
        assert!(matches!(
            encode_frame(&mut buf, &frame, DemoFlags::empty()),
            Err(ReplayError::MalformedFrame { .. })
        ));
        assert!(encode_frame(&mut buf, &frame, DemoFlags::DIGESTS).is_ok());
    }

    #[test]
    fn clean_eof_is_none() {
        let empty: &[u8] = &[];
        assert!(decode_frame(&mut &*empty, DemoFlags::empty())
            .unwrap()
            .is_none());
    }

    #[test]
    fn truncated_tic_is_an_error() {
        let partial: &[u8] = &[1, 0, 0];
        assert!(matches!(
            decode_frame(&mut &*partial, DemoFlags::empty()),
            Err(ReplayError::MalformedFrame { .. })
        ));
    }

    // ── Proptest strategies ─────────────────────────────────────

    fn arb_cmd() -> impl Strategy<Value = TicCmd> {
        (any::<i8>(), any::<i8>(), any::<i16>(), any::<u8>()).prop_map(
            |(forward_move, side_move, angle_turn, buttons)| TicCmd {
                forward_move,
                side_move,
                angle_turn,
                buttons,
                ..TicCmd::default()
            },
        )
    }

    fn arb_set() -> impl Strategy<Value = TicSet> {
        (
            prop::array::uniform8(arb_cmd()),
            prop::array::uniform8(any::<bool>()),
        )
            .prop_map(|(commands, present)| TicSet { commands, present })
    }

    proptest! {
        #[test]
        fn decoded_frame_is_the_quantized_frame(
            tic in any::<u64>(),
            set in arb_set(),
            long_tics in any::<bool>(),
            digest in any::<u64>(),
        ) {
            let mut flags = DemoFlags::DIGESTS;
            if long_tics {
                flags.insert(DemoFlags::LONG_TICS);
            }
            let frame = DemoFrame { tic, set, digest: Some(digest) };

            let mut buf = Vec::new();
            encode_frame(&mut buf, &frame, flags).unwrap();
            let back = decode_frame(&mut buf.as_slice(), flags).unwrap().unwrap();

            prop_assert_eq!(back.tic, tic);
            prop_assert_eq!(back.digest, Some(digest));
            prop_assert_eq!(back.set.present, set.present);
            for i in 0..MAX_PARTICIPANTS {
                if set.present[i] {
                    prop_assert_eq!(back.set.commands[i], quantize(&set.commands[i], long_tics));
                } else {
                    prop_assert_eq!(back.set.commands[i], TicCmd::default());
                }
            }
        }
    }
}
