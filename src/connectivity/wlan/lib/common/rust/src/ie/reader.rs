// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{Header, Id},
    std::mem::size_of,
    zerocopy::LayoutVerified,
};

/// Iterates over a chain of information elements. Iteration stops at the first element whose
/// declared length runs past the end of the buffer; `remaining()` then returns the unparsed
/// tail, so callers that need strict validation can reject the whole chain.
pub struct Reader<'a> {
    remaining: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Reader { remaining: bytes }
    }

    pub fn remaining(&self) -> &'a [u8] {
        self.remaining
    }
}

impl<'a> Iterator for Reader<'a> {
    type Item = (Id, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let (header, rest) =
            LayoutVerified::<_, Header>::new_unaligned_from_prefix(self.remaining)?;
        let body_len = header.body_len as usize;
        if rest.len() < body_len {
            return None;
        }
        let (body, rest) = rest.split_at(body_len);
        self.remaining = rest;
        Some((header.id, body))
    }
}

/// Returns all elements of the chain, or an error if the chain does not end on an element
/// boundary.
pub fn read_all(bytes: &[u8]) -> Result<Vec<(Id, &[u8])>, crate::error::FrameParseError> {
    let mut reader = Reader::new(bytes);
    let elements = (&mut reader).collect::<Vec<_>>();
    if reader.remaining().is_empty() {
        Ok(elements)
    } else {
        Err(crate::error::FrameParseError::new(format!(
            "{} trailing bytes after last complete element (header needs {})",
            reader.remaining().len(),
            size_of::<Header>()
        )))
    }
}
