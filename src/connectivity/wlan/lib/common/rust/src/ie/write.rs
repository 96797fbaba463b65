// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{
        HtCapabilities, HtOperation, Id, SupportedRate, VhtCapabilities, VhtOperation,
        IE_MAX_LEN, SSID_MAX_LEN, SUPPORTED_RATES_MAX_LEN,
    },
    crate::{appendable::Appendable, error::FrameWriteError},
    zerocopy::AsBytes,
};

fn write_element<B: Appendable + ?Sized>(
    buf: &mut B,
    id: Id,
    body: &[u8],
) -> Result<(), FrameWriteError> {
    if body.len() > IE_MAX_LEN {
        return Err(FrameWriteError::new_invalid_data(format!(
            "element {} body too long: {} bytes",
            id.0,
            body.len()
        )));
    }
    buf.append_byte(id.0)?;
    buf.append_byte(body.len() as u8)?;
    buf.append_bytes(body)?;
    Ok(())
}

pub fn write_ssid<B: Appendable + ?Sized>(buf: &mut B, ssid: &[u8]) -> Result<(), FrameWriteError> {
    if ssid.len() > SSID_MAX_LEN {
        return Err(FrameWriteError::new_invalid_data(format!(
            "SSID is too long (max: {} bytes, got: {})",
            SSID_MAX_LEN,
            ssid.len()
        )));
    }
    write_element(buf, Id::SSID, ssid)
}

pub fn write_supported_rates<B: Appendable + ?Sized>(
    buf: &mut B,
    rates: &[u8],
) -> Result<(), FrameWriteError> {
    if rates.is_empty() {
        return Err(FrameWriteError::new_invalid_data("no supported rates"));
    }
    if rates.len() > SUPPORTED_RATES_MAX_LEN {
        return Err(FrameWriteError::new_invalid_data(format!(
            "too many supported rates (max: {}, got: {})",
            SUPPORTED_RATES_MAX_LEN,
            rates.len()
        )));
    }
    write_element(buf, Id::SUPPORTED_RATES, rates)
}

pub fn write_ext_supported_rates<B: Appendable + ?Sized>(
    buf: &mut B,
    rates: &[u8],
) -> Result<(), FrameWriteError> {
    if rates.is_empty() {
        return Err(FrameWriteError::new_invalid_data("no extended supported rates"));
    }
    write_element(buf, Id::EXT_SUPPORTED_RATES, rates)
}

/// Writes Supported Rates and, when more than eight rates are given, Extended Supported Rates.
pub fn write_rates<B: Appendable + ?Sized>(
    buf: &mut B,
    rates: &[SupportedRate],
) -> Result<(), FrameWriteError> {
    let writer = super::rates_writer::RatesWriter::try_new(rates.as_bytes())?;
    writer.write_supported_rates(buf)?;
    writer.write_ext_supported_rates(buf)
}

pub fn write_ht_capabilities<B: Appendable + ?Sized>(
    buf: &mut B,
    ht_cap: &HtCapabilities,
) -> Result<(), FrameWriteError> {
    write_element(buf, Id::HT_CAPABILITIES, ht_cap.as_bytes())
}

pub fn write_ht_operation<B: Appendable + ?Sized>(
    buf: &mut B,
    ht_op: &HtOperation,
) -> Result<(), FrameWriteError> {
    write_element(buf, Id::HT_OPERATION, ht_op.as_bytes())
}

pub fn write_vht_capabilities<B: Appendable + ?Sized>(
    buf: &mut B,
    vht_cap: &VhtCapabilities,
) -> Result<(), FrameWriteError> {
    write_element(buf, Id::VHT_CAPABILITIES, vht_cap.as_bytes())
}

pub fn write_vht_operation<B: Appendable + ?Sized>(
    buf: &mut B,
    vht_op: &VhtOperation,
) -> Result<(), FrameWriteError> {
    write_element(buf, Id::VHT_OPERATION, vht_op.as_bytes())
}

/// The RSNE body is opaque to the MLME: it is produced and validated by the SME.
pub fn write_rsne<B: Appendable + ?Sized>(buf: &mut B, rsne: &[u8]) -> Result<(), FrameWriteError> {
    // Callers hand over the complete element including its header.
    match rsne {
        [id, len, body @ ..] if *id == Id::RSNE.0 && *len as usize == body.len() => {
            buf.append_bytes(rsne)?;
            Ok(())
        }
        _ => Err(FrameWriteError::new_invalid_data("malformed RSNE")),
    }
}
