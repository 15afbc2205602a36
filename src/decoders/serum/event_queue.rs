// DANS : src/decoders/serum/event_queue.rs

use super::account_flags::{decode_account_flags, AccountFlags, AccountKind, ACCOUNT_FLAGS_OFFSET};
use super::math::MarketScale;
use crate::error::{DecodeError, DecodeResult};
use bytemuck::{from_bytes, Pod, Zeroable};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use std::collections::BTreeMap;
use std::mem::size_of;
use tracing::debug;

// --- LAYOUT ---
// [0..5]   "serum"
// [5..13]  account flags
// [13..17] head    + 4 octets à zéro
// [21..25] count   + 4 octets à zéro
// [29..33] seq_num + 4 octets à zéro
// [37..]   slots de 88 octets
pub const EVENT_QUEUE_HEADER_LEN: usize = 37;
pub const EVENT_SLOT_LEN: usize = 88;

const FILL_BIT: u32 = 0;
const OUT_BIT: u32 = 1;
const BID_BIT: u32 = 2;
const MAKER_BIT: u32 = 3;

#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
struct EventQueueHeaderData {
    pub account_flags: u64,
    pub head: u32,
    pub head_padding: u32,
    pub count: u32,
    pub count_padding: u32,
    pub seq_num: u32,
    pub seq_num_padding: u32,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
struct EventSlotData {
    pub event_flags: u8,
    pub open_orders_slot: u8,
    pub fee_tier: u8,
    pub padding: [u8; 5],
    pub native_quantity_released: u64, // Ce que l'utilisateur a reçu
    pub native_quantity_paid: u64,     // Ce que l'utilisateur a payé
    pub native_fee_or_rebate: u64,
    pub order_id: u128,
    pub open_orders: Pubkey,
    pub client_order_id: u64,
}

const _: () = assert!(ACCOUNT_FLAGS_OFFSET + size_of::<EventQueueHeaderData>() == EVENT_QUEUE_HEADER_LEN);
const _: () = assert!(size_of::<EventSlotData>() == EVENT_SLOT_LEN);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Bid,
    Ask,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventFlags {
    pub fill: bool,
    pub out: bool,
    pub bid: bool,
    pub maker: bool,
}

fn is_set(byte: u8, bit: u32) -> bool {
    (byte >> bit) & 1 == 1
}

impl EventFlags {
    pub fn from_byte(byte: u8) -> Self {
        Self {
            fill: is_set(byte, FILL_BIT),
            out: is_set(byte, OUT_BIT),
            bid: is_set(byte, BID_BIT),
            maker: is_set(byte, MAKER_BIT),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventQueueHeader {
    pub account_flags: AccountFlags,
    pub head: u32,
    pub count: u32,
    pub seq_num: u32,
}

/// Un fill décodé, avec son prix et sa quantité en unités affichables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TradeEvent {
    pub event_flags: EventFlags,
    pub open_orders_slot: u8,
    pub fee_tier: u8,
    pub native_quantity_released: u64,
    pub native_quantity_paid: u64,
    pub native_fee_or_rebate: u64,
    pub order_id: u128,
    pub open_orders: Pubkey,
    pub client_order_id: u64,
    pub price: f32,
    pub quantity: f32,
}

impl TradeEvent {
    pub fn side(&self) -> Side {
        if self.event_flags.bid { Side::Bid } else { Side::Ask }
    }

    pub fn is_maker(&self) -> bool {
        self.event_flags.maker
    }

    /// Montant en quote avant frais. Le signe des frais dépend du côté et du rôle :
    /// un maker touche un rebate, un taker paie des frais.
    pub fn price_before_fees(&self) -> f64 {
        let released = self.native_quantity_released as i128;
        let paid = self.native_quantity_paid as i128;
        let fee = self.native_fee_or_rebate as i128;
        let amount = match (self.side(), self.is_maker()) {
            (Side::Bid, true) => paid + fee,
            (Side::Bid, false) => paid - fee,
            (Side::Ask, true) => released - fee,
            (Side::Ask, false) => released + fee,
        };
        amount as f64
    }

    /// Calculé en f64 puis réduit en f32 pour l'affichage.
    fn with_display_values(mut self, scale: &MarketScale) -> Self {
        let base_multiplier = scale.base_multiplier();
        let quote_multiplier = scale.quote_multiplier();
        let top = self.price_before_fees() * base_multiplier;
        let base_native = match self.side() {
            Side::Bid => self.native_quantity_released as f64,
            Side::Ask => self.native_quantity_paid as f64,
        };
        let bottom = quote_multiplier * base_native;
        self.price = (top / bottom) as f32;
        self.quantity = (base_native / base_multiplier) as f32;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventQueue {
    pub header: EventQueueHeader,
    pub capacity: usize,
    pub scale: MarketScale,
    /// Du plus récent au plus ancien, dans l'ordre de parcours du buffer.
    pub events: Vec<TradeEvent>,
    /// Comptes open-orders distincts ayant un fill, triés par leur texte base58.
    pub open_orders_accounts: Vec<Pubkey>,
}

impl EventQueue {
    pub fn events_for_owner<'a>(&'a self, open_orders: &'a Pubkey) -> impl Iterator<Item = &'a TradeEvent> + 'a {
        self.events.iter().filter(move |e| e.open_orders == *open_orders)
    }
}

/// Nombre de slots physiques. La partie après l'en-tête doit être un multiple exact de 88.
pub fn queue_capacity(data_len: usize) -> DecodeResult<usize> {
    let body = data_len
        .checked_sub(EVENT_QUEUE_HEADER_LEN)
        .ok_or(DecodeError::Truncated {
            what: "en-tête Event Queue",
            needed: EVENT_QUEUE_HEADER_LEN,
            actual: data_len,
        })?;
    if body % EVENT_SLOT_LEN != 0 {
        return Err(DecodeError::InvalidQueueLength {
            len: data_len,
            header: EVENT_QUEUE_HEADER_LEN,
            slot: EVENT_SLOT_LEN,
        });
    }
    Ok(body / EVENT_SLOT_LEN)
}

/// Index physique du i-ème slot visité. On part de l'entrée la plus récente
/// (head + count - 1) et on recule sur TOUTE la capacité, pas seulement les `count` slots vivants.
/// `None` pour une capacité nulle ou un `i` hors du buffer.
pub fn slot_index(head: u32, count: u32, capacity: usize, i: usize) -> Option<usize> {
    let capacity = capacity as u64;
    (head as u64 + count as u64 + capacity)
        .checked_sub(1 + i as u64)?
        .checked_rem(capacity)
        .map(|index| index as usize)
}

fn decode_slot(raw: &EventSlotData) -> TradeEvent {
    TradeEvent {
        event_flags: EventFlags::from_byte(raw.event_flags),
        open_orders_slot: raw.open_orders_slot,
        fee_tier: raw.fee_tier,
        native_quantity_released: raw.native_quantity_released,
        native_quantity_paid: raw.native_quantity_paid,
        native_fee_or_rebate: raw.native_fee_or_rebate,
        order_id: raw.order_id,
        open_orders: raw.open_orders,
        client_order_id: raw.client_order_id,
        price: 0.0,
        quantity: 0.0,
    }
}

fn sorted_distinct_owners(events: &[TradeEvent]) -> Vec<Pubkey> {
    events
        .iter()
        .map(|e| (bs58::encode(e.open_orders.as_ref()).into_string(), e.open_orders))
        .collect::<BTreeMap<_, _>>()
        .into_values()
        .collect()
}

/// Décode une Event Queue Serum. Les décimales et tailles de lot viennent du Market associé.
pub fn decode_event_queue(data: &[u8], scale: MarketScale) -> DecodeResult<EventQueue> {
    // Étape 1: Préfixe + flags.
    let account_flags = decode_account_flags(data)?.expect_kind(AccountKind::EventQueue)?;

    // Étape 2: Capacité et en-tête.
    let capacity = queue_capacity(data.len())?;
    let header_raw: &EventQueueHeaderData = from_bytes(&data[ACCOUNT_FLAGS_OFFSET..EVENT_QUEUE_HEADER_LEN]);
    let header = EventQueueHeader {
        account_flags,
        head: header_raw.head,
        count: header_raw.count,
        seq_num: header_raw.seq_num,
    };
    if header.count as usize > capacity {
        return Err(DecodeError::CountExceedsCapacity {
            count: header.count,
            capacity,
        });
    }

    // Étape 3: Parcours du buffer circulaire. Seuls les fills avec un montant payé sont gardés,
    // ce qui écarte aussi les slots périmés.
    let mut events = Vec::new();
    let mut skipped = 0usize;
    for index in (0..capacity).filter_map(|i| slot_index(header.head, header.count, capacity, i)) {
        let offset = EVENT_QUEUE_HEADER_LEN + index * EVENT_SLOT_LEN;
        let raw: &EventSlotData = from_bytes(&data[offset..offset + EVENT_SLOT_LEN]);
        let event = decode_slot(raw);
        if event.event_flags.fill && event.native_quantity_paid > 0 {
            events.push(event.with_display_values(&scale));
        } else {
            skipped += 1;
        }
    }
    debug!(capacity, fills = events.len(), skipped, "Slots de l'Event Queue parcourus");

    // Étape 4: Projection des comptes open-orders.
    let open_orders_accounts = sorted_distinct_owners(&events);

    Ok(EventQueue {
        header,
        capacity,
        scale,
        events,
        open_orders_accounts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoders::serum::account_flags::SERUM_PREFIX;

    const FILL: u8 = 1;
    const OUT: u8 = 2;
    const BID: u8 = 4;
    const MAKER: u8 = 8;

    #[derive(Default, Clone, Copy)]
    struct Slot {
        flags: u8,
        released: u64,
        paid: u64,
        fee: u64,
        owner: [u8; 32],
        client_order_id: u64,
    }

    fn slot_bytes(slot: &Slot) -> [u8; EVENT_SLOT_LEN] {
        let mut bytes = [0u8; EVENT_SLOT_LEN];
        bytes[0] = slot.flags;
        bytes[1] = 3;
        bytes[2] = 1;
        bytes[8..16].copy_from_slice(&slot.released.to_le_bytes());
        bytes[16..24].copy_from_slice(&slot.paid.to_le_bytes());
        bytes[24..32].copy_from_slice(&slot.fee.to_le_bytes());
        bytes[32..48].copy_from_slice(&0xABCDu128.to_le_bytes());
        bytes[48..80].copy_from_slice(&slot.owner);
        bytes[80..88].copy_from_slice(&slot.client_order_id.to_le_bytes());
        bytes
    }

    fn queue_bytes(head: u32, count: u32, seq_num: u32, slots: &[Slot]) -> Vec<u8> {
        let mut data = SERUM_PREFIX.to_vec();
        data.extend_from_slice(&0b1_0001u64.to_le_bytes());
        for value in [head, count, seq_num] {
            data.extend_from_slice(&value.to_le_bytes());
            data.extend_from_slice(&[0u8; 4]);
        }
        for slot in slots {
            data.extend_from_slice(&slot_bytes(slot));
        }
        data
    }

    fn scale(base_decimals: u8, quote_decimals: u8) -> MarketScale {
        MarketScale {
            base_decimals,
            quote_decimals,
            base_lot_size: 100,
            quote_lot_size: 10,
        }
    }

    fn fill(flags: u8, client_order_id: u64) -> Slot {
        Slot {
            flags: FILL | flags,
            released: 2_000,
            paid: 1_000,
            fee: 5,
            owner: [client_order_id as u8; 32],
            client_order_id,
        }
    }

    #[test]
    fn header_fields_are_read_at_fixed_offsets() {
        let data = queue_bytes(1, 2, 42, &[Slot::default(); 3]);
        assert_eq!(&data[13..17], &1u32.to_le_bytes());
        assert_eq!(&data[21..25], &2u32.to_le_bytes());
        assert_eq!(&data[29..33], &42u32.to_le_bytes());

        let queue = decode_event_queue(&data, scale(6, 6)).unwrap();
        assert_eq!(queue.header.head, 1);
        assert_eq!(queue.header.count, 2);
        assert_eq!(queue.header.seq_num, 42);
        assert_eq!(queue.capacity, 3);
        assert!(queue.header.account_flags.is_kind(AccountKind::EventQueue));
    }

    #[test]
    fn capacity_must_be_exact() {
        assert_eq!(queue_capacity(37 + 88 * 4).unwrap(), 4);
        assert_eq!(queue_capacity(37).unwrap(), 0);
        assert!(matches!(
            queue_capacity(37 + 88 * 4 + 1),
            Err(DecodeError::InvalidQueueLength { .. })
        ));

        let mut data = queue_bytes(0, 0, 0, &[Slot::default(); 2]);
        data.push(0);
        assert!(matches!(
            decode_event_queue(&data, scale(6, 6)),
            Err(DecodeError::InvalidQueueLength { .. })
        ));
    }

    #[test]
    fn ask_taker_fill_adds_fee_to_released() {
        let data = queue_bytes(0, 1, 1, &[fill(0, 1), Slot::default(), Slot::default()]);
        let queue = decode_event_queue(&data, scale(6, 6)).unwrap();

        assert_eq!(queue.events.len(), 1);
        let event = &queue.events[0];
        assert_eq!(event.side(), Side::Ask);
        assert!(!event.is_maker());
        assert_eq!(event.price_before_fees(), 2_005.0);
        assert_eq!(event.price, ((2_005.0 * 1e6) / (1e6 * 1_000.0)) as f32);
        assert_eq!(event.quantity, (1_000.0 / 1e6) as f32);
        assert_eq!(event.order_id, 0xABCD);
        assert_eq!(event.open_orders_slot, 3);
        assert_eq!(event.fee_tier, 1);
    }

    #[test]
    fn bid_maker_fill_adds_rebate_to_paid() {
        let slot = Slot {
            flags: FILL | BID | MAKER,
            released: 1_000,
            paid: 500,
            fee: 2,
            owner: [9; 32],
            client_order_id: 77,
        };
        let data = queue_bytes(0, 1, 1, &[slot]);
        let queue = decode_event_queue(&data, scale(6, 6)).unwrap();

        let event = &queue.events[0];
        assert_eq!(event.side(), Side::Bid);
        assert_eq!(event.price_before_fees(), 502.0);
        let expected = (502.0f64 * 1_000_000.0) / (1_000_000.0 * 1_000.0);
        assert_eq!(event.price, expected as f32);
        assert_eq!(event.quantity, (1_000.0f64 / 1_000_000.0) as f32);
    }

    #[test]
    fn taker_fee_larger_than_paid_does_not_wrap() {
        let slot = Slot {
            flags: FILL | BID,
            released: 10,
            paid: 3,
            fee: 5,
            ..Slot::default()
        };
        let data = queue_bytes(0, 1, 1, &[slot]);
        let queue = decode_event_queue(&data, scale(0, 0)).unwrap();
        assert_eq!(queue.events[0].price_before_fees(), -2.0);
        assert_eq!(queue.events[0].price, (-2.0f64 / 10.0) as f32);
    }

    #[test]
    fn fill_without_paid_amount_is_skipped() {
        let mut empty_fill = fill(0, 1);
        empty_fill.paid = 0;
        let data = queue_bytes(0, 2, 2, &[empty_fill, fill(BID, 2)]);
        let queue = decode_event_queue(&data, scale(6, 6)).unwrap();

        assert_eq!(queue.events.len(), 1);
        assert_eq!(queue.events[0].client_order_id, 2);
    }

    #[test]
    fn out_events_are_skipped() {
        let out = Slot {
            flags: OUT | BID,
            paid: 1_000,
            ..Slot::default()
        };
        let data = queue_bytes(0, 1, 1, &[out]);
        assert!(decode_event_queue(&data, scale(6, 6)).unwrap().events.is_empty());
    }

    #[test]
    fn empty_header_still_scans_every_slot() {
        let data = queue_bytes(0, 0, 9, &[fill(0, 10), fill(0, 11), fill(0, 12)]);
        let queue = decode_event_queue(&data, scale(6, 6)).unwrap();

        let order: Vec<u64> = queue.events.iter().map(|e| e.client_order_id).collect();
        assert_eq!(order, vec![12, 11, 10]);
    }

    #[test]
    fn traversal_starts_at_newest_entry_and_wraps() {
        assert_eq!(
            (0..4).filter_map(|i| slot_index(2, 2, 4, i)).collect::<Vec<_>>(),
            vec![3, 2, 1, 0]
        );
        assert_eq!(
            (0..4).filter_map(|i| slot_index(3, 2, 4, i)).collect::<Vec<_>>(),
            vec![0, 3, 2, 1]
        );

        let slots = [fill(0, 0), fill(0, 1), fill(0, 2), fill(0, 3)];
        let queue = decode_event_queue(&queue_bytes(3, 2, 5, &slots), scale(6, 6)).unwrap();
        let order: Vec<u64> = queue.events.iter().map(|e| e.client_order_id).collect();
        assert_eq!(order, vec![0, 3, 2, 1]);
    }

    #[test]
    fn decoding_is_deterministic() {
        let data = queue_bytes(1, 2, 3, &[fill(BID, 1), fill(MAKER, 2), fill(BID | MAKER, 3)]);
        let first = decode_event_queue(&data, scale(9, 6)).unwrap();
        let second = decode_event_queue(&data, scale(9, 6)).unwrap();

        assert_eq!(first, second);
        let bits = |q: &EventQueue| q.events.iter().map(|e| (e.price.to_bits(), e.quantity.to_bits())).collect::<Vec<_>>();
        assert_eq!(bits(&first), bits(&second));
    }

    #[test]
    fn owners_are_distinct_and_sorted_by_base58() {
        // Ordre des octets : 1 < 9 < 60. Ordre base58 : "4vJ9..." < "548j..." < "cGfH...".
        let a = fill(0, 1);
        let b = fill(0, 60);
        let c = fill(0, 9);
        let a_again = fill(BID, 1);
        let data = queue_bytes(0, 4, 4, &[c, a, b, a_again]);
        let queue = decode_event_queue(&data, scale(6, 6)).unwrap();

        assert_eq!(queue.events.len(), 4);
        assert_eq!(
            queue.open_orders_accounts,
            vec![
                Pubkey::new_from_array([1; 32]),
                Pubkey::new_from_array([60; 32]),
                Pubkey::new_from_array([9; 32]),
            ]
        );
        let prefixes: Vec<String> = queue
            .open_orders_accounts
            .iter()
            .map(|k| k.to_string()[..4].to_string())
            .collect();
        assert_eq!(prefixes, vec!["4vJ9", "548j", "cGfH"]);

        let owner_a = Pubkey::new_from_array([1; 32]);
        assert_eq!(queue.events_for_owner(&owner_a).count(), 2);
    }

    #[test]
    fn slot_index_without_capacity_is_none() {
        assert_eq!(slot_index(0, 0, 0, 0), None);
        assert_eq!(slot_index(5, 3, 0, 2), None);
        assert_eq!(slot_index(0, 0, 4, 3), Some(0));
    }

    #[test]
    fn count_larger_than_capacity_is_rejected() {
        let data = queue_bytes(0, 3, 0, &[Slot::default(); 2]);
        assert!(matches!(
            decode_event_queue(&data, scale(6, 6)),
            Err(DecodeError::CountExceedsCapacity { count: 3, capacity: 2 })
        ));
    }

    #[test]
    fn market_account_is_not_an_event_queue() {
        let mut data = queue_bytes(0, 0, 0, &[Slot::default()]);
        data[5..13].copy_from_slice(&0b11u64.to_le_bytes());
        assert!(matches!(
            decode_event_queue(&data, scale(6, 6)),
            Err(DecodeError::UnexpectedAccountFlags { expected: "EventQueue", .. })
        ));
    }
}
