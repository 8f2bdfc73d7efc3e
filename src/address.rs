use bon::bon;
use std::fmt;

/// System identifier stored in the lowest bits of every address.
///
/// BMON diamonds are read out through the TOF electronics and share its
/// address layout.
pub const SYSTEM_ID: u32 = 6;

const SYSTEM_BITS: u32 = 4;
const SM_BITS: u32 = 7;
const SM_TYPE_BITS: u32 = 4;
const SIDE_BITS: u32 = 1;
const RPC_BITS: u32 = 6;
const CHANNEL_BITS: u32 = 6;
const RPC_TYPE_BITS: u32 = 4;

const SM_OFFSET: u32 = SYSTEM_BITS;
const SM_TYPE_OFFSET: u32 = SM_OFFSET + SM_BITS;
const SIDE_OFFSET: u32 = SM_TYPE_OFFSET + SM_TYPE_BITS;
const RPC_OFFSET: u32 = SIDE_OFFSET + SIDE_BITS;
const CHANNEL_OFFSET: u32 = RPC_OFFSET + RPC_BITS;
const RPC_TYPE_OFFSET: u32 = CHANNEL_OFFSET + CHANNEL_BITS;

const fn mask(bits: u32) -> u32 {
    (1 << bits) - 1
}

const fn field(raw: u32, offset: u32, bits: u32) -> u32 {
    (raw >> offset) & mask(bits)
}

/// Unique address of a detector channel.
///
/// The address packs (from the least significant bit) the system id, the
/// super module id and type, the channel side, the RPC id, the channel id and
/// the RPC type into a single `u32`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(u32);

#[bon]
impl Address {
    /// Builds an address from its fields. Values wider than their field are
    /// truncated.
    ///
    /// # Examples
    ///
    /// ```
    /// use bmon::address::Address;
    ///
    /// let address = Address::builder().sm_type(5).channel(3).build();
    /// assert_eq!(address.sm_type(), 5);
    /// assert_eq!(address.channel(), 3);
    /// assert_eq!(address.side(), 0);
    /// ```
    #[builder]
    pub fn new(
        #[builder(default)] sm: u32,
        #[builder(default)] sm_type: u32,
        #[builder(default)] side: u32,
        #[builder(default)] rpc: u32,
        #[builder(default)] channel: u32,
        #[builder(default)] rpc_type: u32,
    ) -> Self {
        Self(
            (SYSTEM_ID & mask(SYSTEM_BITS))
                | ((sm & mask(SM_BITS)) << SM_OFFSET)
                | ((sm_type & mask(SM_TYPE_BITS)) << SM_TYPE_OFFSET)
                | ((side & mask(SIDE_BITS)) << SIDE_OFFSET)
                | ((rpc & mask(RPC_BITS)) << RPC_OFFSET)
                | ((channel & mask(CHANNEL_BITS)) << CHANNEL_OFFSET)
                | ((rpc_type & mask(RPC_TYPE_BITS)) << RPC_TYPE_OFFSET),
        )
    }
}

impl Address {
    /// Bitmask that clears the channel id and the channel side.
    ///
    /// Two addresses that are equal after applying this mask belong to the
    /// same diamond.
    pub const DIAMOND_MASK: u32 =
        !((mask(CHANNEL_BITS) << CHANNEL_OFFSET) | (mask(SIDE_BITS) << SIDE_OFFSET));

    pub const fn raw(&self) -> u32 {
        self.0
    }
    pub const fn system_id(&self) -> u32 {
        field(self.0, 0, SYSTEM_BITS)
    }
    pub const fn sm(&self) -> u32 {
        field(self.0, SM_OFFSET, SM_BITS)
    }
    pub const fn sm_type(&self) -> u32 {
        field(self.0, SM_TYPE_OFFSET, SM_TYPE_BITS)
    }
    pub const fn side(&self) -> u32 {
        field(self.0, SIDE_OFFSET, SIDE_BITS)
    }
    pub const fn rpc(&self) -> u32 {
        field(self.0, RPC_OFFSET, RPC_BITS)
    }
    /// Channel (strip) number inside the diamond.
    pub const fn channel(&self) -> u32 {
        field(self.0, CHANNEL_OFFSET, CHANNEL_BITS)
    }
    pub const fn rpc_type(&self) -> u32 {
        field(self.0, RPC_TYPE_OFFSET, RPC_TYPE_BITS)
    }
    /// Returns the same address with the channel id replaced.
    ///
    /// # Examples
    ///
    /// ```
    /// use bmon::address::Address;
    ///
    /// let address = Address::builder().sm(2).channel(7).build();
    /// assert_eq!(address.with_channel(4).channel(), 4);
    /// assert_eq!(address.with_channel(4).sm(), 2);
    /// ```
    pub const fn with_channel(self, channel: u32) -> Self {
        let cleared = self.0 & !(mask(CHANNEL_BITS) << CHANNEL_OFFSET);
        Self(cleared | ((channel & mask(CHANNEL_BITS)) << CHANNEL_OFFSET))
    }
}

impl From<u32> for Address {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<Address> for u32 {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:08x} (system {}, sm {}, sm type {}, rpc {}, channel {}, side {}, rpc type {})",
            self.0,
            self.system_id(),
            self.sm(),
            self.sm_type(),
            self.rpc(),
            self.channel(),
            self.side(),
            self.rpc_type()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_fields() {
        let address = Address::builder()
            .sm(3)
            .sm_type(5)
            .side(1)
            .rpc(2)
            .channel(17)
            .rpc_type(9)
            .build();

        assert_eq!(address.system_id(), SYSTEM_ID);
        assert_eq!(address.sm(), 3);
        assert_eq!(address.sm_type(), 5);
        assert_eq!(address.side(), 1);
        assert_eq!(address.rpc(), 2);
        assert_eq!(address.channel(), 17);
        assert_eq!(address.rpc_type(), 9);
    }

    #[test]
    fn address_layout() {
        assert_eq!(RPC_TYPE_OFFSET + RPC_TYPE_BITS, 32);

        let address = Address::builder().channel(1).build();
        assert_eq!(address.raw(), SYSTEM_ID | (1 << 22));

        let address = Address::builder().side(1).build();
        assert_eq!(address.raw(), SYSTEM_ID | (1 << 15));
    }

    #[test]
    fn address_truncation() {
        let address = Address::builder().channel(64 + 5).sm_type(16).build();
        assert_eq!(address.channel(), 5);
        assert_eq!(address.sm_type(), 0);
    }

    #[test]
    fn address_diamond_mask() {
        let a = Address::builder().sm(1).sm_type(5).channel(0).build();
        let b = Address::builder().sm(1).sm_type(5).channel(15).side(1).build();
        let c = Address::builder().sm(2).sm_type(5).channel(0).build();

        assert_eq!(
            a.raw() & Address::DIAMOND_MASK,
            b.raw() & Address::DIAMOND_MASK
        );
        assert_ne!(
            a.raw() & Address::DIAMOND_MASK,
            c.raw() & Address::DIAMOND_MASK
        );
    }

    #[test]
    fn address_raw_conversion() {
        let address = Address::builder().sm(4).channel(2).build();
        let raw = u32::from(address);
        assert_eq!(Address::from(raw), address);
    }

    #[test]
    fn address_to_string() {
        let address = Address::builder().sm_type(5).channel(3).build();
        assert_eq!(
            address.to_string(),
            "0x00c02806 (system 6, sm 0, sm type 5, rpc 0, channel 3, side 0, rpc type 0)"
        );
    }
}
