//! Price level: aggregate quantity plus the FIFO queue of resting orders

use common::{ModelResult, Quantity};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

use crate::order::{BookOrder, BookPrice, OrderId};

/// All orders resting at one price
///
/// Orders are queued by a ladder-assigned priority, lower first, which gives
/// time priority within the level. A level is never left empty on a ladder:
/// the ladder drops it as soon as its last order goes.
#[derive(Debug, Clone)]
pub struct Level {
    price: BookPrice,
    size: Quantity,
    queue: BTreeMap<u64, BookOrder>,
    slots: FxHashMap<OrderId, u64>,
}

impl Level {
    /// Create a level holding a single order
    pub(crate) fn from_order(order: BookOrder, priority: u64) -> Self {
        let mut queue = BTreeMap::new();
        queue.insert(priority, order);
        let mut slots = FxHashMap::default();
        slots.insert(order.order_id, priority);
        Self {
            price: order.book_price(),
            size: order.size,
            queue,
            slots,
        }
    }

    /// Price of this level
    #[inline]
    #[must_use]
    pub const fn price(&self) -> BookPrice {
        self.price
    }

    /// Aggregate quantity of all orders at this level
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Quantity {
        self.size
    }

    /// Number of orders at this level
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the level holds no orders
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Orders in time priority
    pub fn orders(&self) -> impl Iterator<Item = &BookOrder> {
        self.queue.values()
    }

    /// Order ids in time priority
    pub fn order_ids(&self) -> impl Iterator<Item = OrderId> + '_ {
        self.queue.values().map(|o| o.order_id)
    }

    /// Look up an order at this level
    #[must_use]
    pub fn order(&self, order_id: OrderId) -> Option<&BookOrder> {
        self.slots
            .get(&order_id)
            .and_then(|priority| self.queue.get(priority))
    }

    /// Zero-based queue position of an order
    #[must_use]
    pub fn queue_position(&self, order_id: OrderId) -> Option<usize> {
        let priority = *self.slots.get(&order_id)?;
        Some(self.queue.range(..priority).count())
    }

    /// Aggregate after adding `size`, without touching the level
    pub(crate) fn size_with(&self, size: &Quantity) -> ModelResult<Quantity> {
        self.size.checked_add(size)
    }

    /// Append an order at the back of the queue
    pub(crate) fn insert(&mut self, order: BookOrder, priority: u64) -> ModelResult<()> {
        let total = self.size_with(&order.size)?;
        self.queue.insert(priority, order);
        self.slots.insert(order.order_id, priority);
        self.size = total;
        Ok(())
    }

    /// Remove an order, returning it if present
    pub(crate) fn remove(&mut self, order_id: OrderId) -> Option<BookOrder> {
        let priority = self.slots.remove(&order_id)?;
        let order = self.queue.remove(&priority)?;
        // Every queued size went into the aggregate at this precision
        self.size = self
            .size
            .with_raw(self.size.raw().saturating_sub(order.size.raw()));
        Some(order)
    }

    /// Change an order's size in place
    ///
    /// With `requeue` set the order moves to the back of the queue under the
    /// new priority; otherwise it keeps its place.
    pub(crate) fn resize(
        &mut self,
        order_id: OrderId,
        size: Quantity,
        sequence: u64,
        requeue: Option<u64>,
    ) -> ModelResult<bool> {
        let Some(&priority) = self.slots.get(&order_id) else {
            return Ok(false);
        };
        let Some(current) = self.queue.get(&priority).copied() else {
            return Ok(false);
        };
        let total = self.size.checked_sub(&current.size)?.checked_add(&size)?;

        let updated = BookOrder {
            size,
            sequence,
            ..current
        };
        match requeue {
            Some(next) => {
                self.queue.remove(&priority);
                self.queue.insert(next, updated);
                self.slots.insert(order_id, next);
            }
            None => {
                self.queue.insert(priority, updated);
            }
        }
        self.size = total;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OrderSide, Price};

    fn order(id: OrderId, qty: u64) -> BookOrder {
        BookOrder::new(
            id,
            OrderSide::Buy,
            Price::from_raw(10_000, 2).unwrap(),
            Quantity::from_raw(qty, 0).unwrap(),
            id,
        )
    }

    #[test]
    fn test_level_aggregates_and_queues() {
        let mut level = Level::from_order(order(1, 10), 0);
        level.insert(order(2, 5), 1).unwrap();
        level.insert(order(3, 1), 2).unwrap();

        assert_eq!(level.len(), 3);
        assert_eq!(level.size().raw(), 16);
        assert_eq!(level.order_ids().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(level.queue_position(3), Some(2));

        let removed = level.remove(2).unwrap();
        assert_eq!(removed.size.raw(), 5);
        assert_eq!(level.size().raw(), 11);
        assert_eq!(level.queue_position(3), Some(1));
        assert!(level.remove(2).is_none());
    }

    #[test]
    fn test_resize_keeps_or_loses_priority() {
        let mut level = Level::from_order(order(1, 10), 0);
        level.insert(order(2, 10), 1).unwrap();

        assert!(level.resize(1, Quantity::from_raw(4, 0).unwrap(), 9, None).unwrap());
        assert_eq!(level.order_ids().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(level.size().raw(), 14);
        assert_eq!(level.order(1).unwrap().sequence, 9);

        assert!(level.resize(1, Quantity::from_raw(20, 0).unwrap(), 10, Some(2)).unwrap());
        assert_eq!(level.order_ids().collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(level.size().raw(), 30);

        assert!(!level.resize(99, Quantity::from_raw(1, 0).unwrap(), 0, None).unwrap());
    }

    #[test]
    fn test_precision_mismatch_rejected() {
        let mut level = Level::from_order(order(1, 10), 0);
        let mut odd = order(2, 10);
        odd.size = Quantity::from_raw(10, 3).unwrap();
        assert!(level.insert(odd, 1).is_err());
        assert_eq!(level.len(), 1);
        assert_eq!(level.size().raw(), 10);
        assert!(level.order(2).is_none());
    }
}
