//! One side of an order book
//!
//! Price levels live in a `BTreeMap` keyed best-first, with an order id cache
//! giving O(1) access to the level an order rests on. Every mutation either
//! completes or leaves the ladder untouched.

use common::{BookType, ModelError, OrderSide, Price, Quantity};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

use crate::error::{BookError, BookResult};
use crate::level::Level;
use crate::order::{BookOrder, BookPrice, OrderId};

/// Price-ordered levels for one side of the book
#[derive(Debug, Clone)]
pub struct Ladder {
    side: OrderSide,
    book_type: BookType,
    levels: BTreeMap<BookPrice, Level>,
    cache: FxHashMap<OrderId, BookPrice>,
    next_priority: u64,
}

impl Ladder {
    /// Create an empty ladder
    #[must_use]
    pub fn new(side: OrderSide, book_type: BookType) -> Self {
        Self {
            side,
            book_type,
            levels: BTreeMap::new(),
            cache: FxHashMap::default(),
            next_priority: 0,
        }
    }

    /// Ladder side
    #[inline]
    #[must_use]
    pub const fn side(&self) -> OrderSide {
        self.side
    }

    /// Granularity this ladder tracks
    #[inline]
    #[must_use]
    pub const fn book_type(&self) -> BookType {
        self.book_type
    }

    /// Number of price levels
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether the ladder has no levels
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Number of resting orders across all levels
    #[inline]
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.cache.len()
    }

    /// Id under which this ladder tracks an order at `price`
    ///
    /// L3 keeps the caller's id. L2 tracks one synthetic order per level and
    /// L1 one per side, so the caller's id is discarded. `None` when no L2
    /// level rests at `price`.
    #[must_use]
    pub fn order_key(&self, price: &Price, order_id: OrderId) -> Option<OrderId> {
        match self.book_type {
            BookType::L3Mbo => Some(order_id),
            BookType::L2Mbp => self.level(*price).and_then(|l| l.order_ids().next()),
            BookType::L1Tbbo => Some(self.side as u64),
        }
    }

    /// Add resting quantity at `price`
    ///
    /// # Errors
    ///
    /// [`BookError::ZeroQuantity`] for an empty size, [`BookError::DuplicateOrder`]
    /// when an L3 id already rests here, or a model error when precisions disagree
    /// with the target level.
    pub fn add_order(
        &mut self,
        price: Price,
        size: Quantity,
        order_id: OrderId,
        sequence: u64,
    ) -> BookResult<()> {
        if size.is_zero() {
            return Err(BookError::ZeroQuantity { order_id });
        }
        match self.book_type {
            BookType::L1Tbbo => {
                let key = self.side as u64;
                self.set_top(BookOrder::new(key, self.side, price, size, sequence));
                Ok(())
            }
            BookType::L2Mbp => match self.order_key(&price, order_id) {
                Some(key) => {
                    let (book_price, resting) = self.locate(key)?;
                    let total = resting.size.checked_add(&size)?;
                    self.resize(book_price, key, total, sequence, None)
                }
                None => {
                    // Synthetic ids come from the priority counter, unique per ladder
                    let key = self.next_priority;
                    self.insert(BookOrder::new(key, self.side, price, size, sequence))
                }
            },
            BookType::L3Mbo => {
                let key = order_id;
                if self.cache.contains_key(&key) {
                    return Err(BookError::DuplicateOrder {
                        order_id,
                        side: self.side,
                    });
                }
                self.insert(BookOrder::new(key, self.side, price, size, sequence))
            }
        }
    }

    /// Move or resize a resting order
    ///
    /// A zero `size` deletes the order. A smaller size at the same price keeps
    /// queue priority; anything else sends the order to the back of its queue.
    /// Under L2 `size` is the new absolute quantity of the level at `price`.
    ///
    /// # Errors
    ///
    /// [`BookError::NotFound`] for an unknown order, or a model error when
    /// precisions disagree with the target level.
    pub fn update_order(
        &mut self,
        order_id: OrderId,
        price: Price,
        size: Quantity,
        sequence: u64,
    ) -> BookResult<()> {
        if self.book_type == BookType::L1Tbbo {
            if size.is_zero() {
                self.clear();
            } else {
                let key = self.side as u64;
                self.set_top(BookOrder::new(key, self.side, price, size, sequence));
            }
            return Ok(());
        }

        let key = self.resolve(&price, order_id)?;
        let (current, resting) = self.locate(key)?;
        if size.is_zero() {
            return self.remove(key).map(|_| ());
        }

        let target = BookPrice::new(price, self.side);
        if target == current {
            let requeue = (size > resting.size).then_some(self.next_priority);
            self.resize(current, key, size, sequence, requeue)?;
            if requeue.is_some() {
                self.next_priority += 1;
            }
            return Ok(());
        }

        if let Some(level) = self.levels.get(&target) {
            level.size_with(&size)?;
        }
        self.remove(key)?;
        self.insert(BookOrder {
            price,
            size,
            sequence,
            ..resting
        })
    }

    /// Remove a resting order by the id this ladder tracks it under
    ///
    /// Under L1 the id is ignored and the top level is removed. Under L2 use
    /// [`Ladder::delete_order_at`] or an id from [`Ladder::order_key`].
    ///
    /// # Errors
    ///
    /// [`BookError::NotFound`] for an unknown order.
    pub fn delete_order(&mut self, order_id: OrderId) -> BookResult<BookOrder> {
        let key = match self.book_type {
            BookType::L1Tbbo => self.side as u64,
            _ => order_id,
        };
        self.remove(key)
    }

    /// Remove the order a feed event refers to at `price`
    ///
    /// # Errors
    ///
    /// [`BookError::NotFound`] for an unknown order or, under L2, an empty price.
    pub fn delete_order_at(&mut self, price: Price, order_id: OrderId) -> BookResult<BookOrder> {
        let key = self.resolve(&price, order_id)?;
        self.remove(key)
    }

    /// Reduce a resting order by a traded quantity
    ///
    /// The order goes when its size reaches zero, and its level with it.
    ///
    /// # Errors
    ///
    /// [`BookError::NotFound`] for an unknown order and
    /// [`ModelError::Overflow`] when `size` exceeds the resting quantity.
    pub fn fill_order(
        &mut self,
        order_id: OrderId,
        price: Price,
        size: Quantity,
    ) -> BookResult<()> {
        let key = self.resolve(&price, order_id)?;
        let (current, resting) = self.locate(key)?;
        let remaining = resting
            .size
            .checked_sub(&size)
            .map_err(|e| match e {
                ModelError::Overflow { .. } => ModelError::Overflow { op: "fill" },
                other => other,
            })?;

        if remaining.is_zero() {
            self.remove(key).map(|_| ())
        } else {
            self.resize(current, key, remaining, resting.sequence, None)
        }
    }

    /// Drop every level and order
    pub fn clear(&mut self) {
        self.levels.clear();
        self.cache.clear();
    }

    /// Best price on this side
    ///
    /// # Errors
    ///
    /// [`BookError::EmptyLadder`] when there are no levels.
    pub fn best_price(&self) -> BookResult<Price> {
        self.top()
            .map(|level| level.price().value)
            .ok_or(BookError::EmptyLadder { side: self.side })
    }

    /// Best level on this side
    #[must_use]
    pub fn top(&self) -> Option<&Level> {
        self.levels.values().next()
    }

    /// Level at an exact price
    #[must_use]
    pub fn level(&self, price: Price) -> Option<&Level> {
        self.levels.get(&BookPrice::new(price, self.side))
    }

    /// Resting order by id
    #[must_use]
    pub fn order(&self, order_id: OrderId) -> Option<&BookOrder> {
        let key = self.cache.get(&order_id)?;
        self.levels.get(key)?.order(order_id)
    }

    /// Levels best first
    pub fn levels(&self) -> impl Iterator<Item = &Level> {
        self.levels.values()
    }

    /// Top `n` levels as `(price, size)` pairs, best first
    #[must_use]
    pub fn depth(&self, n: usize) -> Depth<'_> {
        Depth {
            levels: self.levels.values().take(n),
        }
    }

    /// Sum of all level sizes, `None` when empty
    ///
    /// # Errors
    ///
    /// A model error if level precisions disagree or the sum overflows.
    pub fn total_quantity(&self) -> BookResult<Option<Quantity>> {
        let mut levels = self.levels.values();
        let Some(first) = levels.next() else {
            return Ok(None);
        };
        let mut total = first.size();
        for level in levels {
            total.add_in_place(&level.size())?;
        }
        Ok(Some(total))
    }

    fn resolve(&self, price: &Price, order_id: OrderId) -> BookResult<OrderId> {
        self.order_key(price, order_id).ok_or(BookError::NotFound {
            order_id,
            side: self.side,
        })
    }

    fn locate(&self, order_id: OrderId) -> BookResult<(BookPrice, BookOrder)> {
        let not_found = BookError::NotFound {
            order_id,
            side: self.side,
        };
        let Some(&key) = self.cache.get(&order_id) else {
            return Err(not_found);
        };
        self.levels
            .get(&key)
            .and_then(|level| level.order(order_id))
            .map(|order| (key, *order))
            .ok_or(not_found)
    }

    fn insert(&mut self, order: BookOrder) -> BookResult<()> {
        let key = order.book_price();
        let priority = self.next_priority;
        match self.levels.get_mut(&key) {
            Some(level) => level.insert(order, priority)?,
            None => {
                self.levels.insert(key, Level::from_order(order, priority));
            }
        }
        self.next_priority += 1;
        self.cache.insert(order.order_id, key);
        Ok(())
    }

    fn resize(
        &mut self,
        at: BookPrice,
        order_id: OrderId,
        size: Quantity,
        sequence: u64,
        requeue: Option<u64>,
    ) -> BookResult<()> {
        let not_found = BookError::NotFound {
            order_id,
            side: self.side,
        };
        let level = self.levels.get_mut(&at).ok_or(not_found.clone())?;
        if level.resize(order_id, size, sequence, requeue)? {
            Ok(())
        } else {
            Err(not_found)
        }
    }

    fn remove(&mut self, order_id: OrderId) -> BookResult<BookOrder> {
        let not_found = BookError::NotFound {
            order_id,
            side: self.side,
        };
        let Some(&key) = self.cache.get(&order_id) else {
            return Err(not_found);
        };
        let level = self.levels.get_mut(&key).ok_or(not_found.clone())?;
        let order = level.remove(order_id).ok_or(not_found)?;
        if level.is_empty() {
            self.levels.remove(&key);
        }
        self.cache.remove(&order_id);
        Ok(order)
    }

    fn set_top(&mut self, order: BookOrder) {
        self.clear();
        let priority = self.next_priority;
        self.next_priority += 1;
        self.cache.insert(order.order_id, order.book_price());
        self.levels
            .insert(order.book_price(), Level::from_order(order, priority));
    }
}

impl fmt::Display for Ladder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ladder({}, {} levels", self.side, self.levels.len())?;
        for level in self.levels.values() {
            write!(f, ", {}x{}", level.price(), level.size())?;
        }
        f.write_str(")")
    }
}

/// Iterator over the best levels of a ladder
#[derive(Debug, Clone)]
pub struct Depth<'a> {
    levels: std::iter::Take<btree_map::Values<'a, BookPrice, Level>>,
}

impl Iterator for Depth<'_> {
    type Item = (Price, Quantity);

    fn next(&mut self) -> Option<Self::Item> {
        self.levels
            .next()
            .map(|level| (level.price().value, level.size()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.levels.size_hint()
    }
}

impl ExactSizeIterator for Depth<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    fn px(raw: i64) -> Price {
        Price::from_raw(raw, 2).unwrap()
    }

    fn qty(raw: u64) -> Quantity {
        Quantity::from_raw(raw, 0).unwrap()
    }

    #[fixture]
    fn bids() -> Ladder {
        Ladder::new(OrderSide::Buy, BookType::L3Mbo)
    }

    #[rstest]
    fn test_bids_best_first(mut bids: Ladder) {
        bids.add_order(px(10_000), qty(5), 1, 1).unwrap();
        bids.add_order(px(10_050), qty(3), 2, 2).unwrap();
        bids.add_order(px(9_950), qty(7), 3, 3).unwrap();

        assert_eq!(bids.best_price().unwrap(), px(10_050));
        let depth: Vec<_> = bids.depth(2).collect();
        assert_eq!(depth, vec![(px(10_050), qty(3)), (px(10_000), qty(5))]);
    }

    #[test]
    fn test_asks_best_first() {
        let mut asks = Ladder::new(OrderSide::Sell, BookType::L3Mbo);
        asks.add_order(px(10_100), qty(1), 1, 1).unwrap();
        asks.add_order(px(10_075), qty(2), 2, 2).unwrap();
        assert_eq!(asks.best_price().unwrap(), px(10_075));
    }

    #[rstest]
    fn test_same_price_aggregates_fifo(mut bids: Ladder) {
        bids.add_order(px(10_000), qty(5), 1, 1).unwrap();
        bids.add_order(px(10_000), qty(3), 2, 2).unwrap();

        assert_eq!(bids.len(), 1);
        let level = bids.top().unwrap();
        assert_eq!(level.size(), qty(8));
        assert_eq!(level.order_ids().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[rstest]
    fn test_duplicate_and_zero_rejected(mut bids: Ladder) {
        bids.add_order(px(10_000), qty(5), 1, 1).unwrap();
        assert_eq!(
            bids.add_order(px(10_100), qty(5), 1, 2),
            Err(BookError::DuplicateOrder {
                order_id: 1,
                side: OrderSide::Buy
            })
        );
        assert_eq!(
            bids.add_order(px(10_100), qty(0), 2, 3),
            Err(BookError::ZeroQuantity { order_id: 2 })
        );
        assert_eq!(bids.len(), 1);
        assert_eq!(bids.order_count(), 1);
    }

    #[rstest]
    fn test_update_moves_between_levels(mut bids: Ladder) {
        bids.add_order(px(10_000), qty(5), 1, 1).unwrap();
        bids.add_order(px(10_000), qty(2), 2, 2).unwrap();

        bids.update_order(1, px(10_050), qty(4), 3).unwrap();
        assert_eq!(bids.len(), 2);
        assert_eq!(bids.level(px(10_000)).unwrap().size(), qty(2));
        assert_eq!(bids.level(px(10_050)).unwrap().size(), qty(4));
        assert_eq!(bids.order(1).unwrap().price, px(10_050));
        assert_eq!(bids.order(1).unwrap().sequence, 3);

        bids.update_order(2, px(10_050), qty(2), 4).unwrap();
        assert_eq!(bids.len(), 1);
        assert_eq!(
            bids.top().unwrap().order_ids().collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[rstest]
    fn test_update_priority_rules(mut bids: Ladder) {
        bids.add_order(px(10_000), qty(5), 1, 1).unwrap();
        bids.add_order(px(10_000), qty(5), 2, 2).unwrap();

        bids.update_order(1, px(10_000), qty(4), 3).unwrap();
        assert_eq!(bids.top().unwrap().queue_position(1), Some(0));

        bids.update_order(1, px(10_000), qty(6), 4).unwrap();
        assert_eq!(bids.top().unwrap().queue_position(1), Some(1));
        assert_eq!(bids.top().unwrap().size(), qty(11));
    }

    #[rstest]
    fn test_update_zero_deletes(mut bids: Ladder) {
        bids.add_order(px(10_000), qty(5), 1, 1).unwrap();
        bids.update_order(1, px(10_000), qty(0), 2).unwrap();
        assert!(bids.is_empty());
        assert!(bids.order(1).is_none());
    }

    #[rstest]
    fn test_unknown_order_not_found(mut bids: Ladder) {
        let err = BookError::NotFound {
            order_id: 9,
            side: OrderSide::Buy,
        };
        assert_eq!(bids.update_order(9, px(1), qty(1), 1), Err(err.clone()));
        assert_eq!(bids.delete_order(9).map(|_| ()), Err(err.clone()));
        assert_eq!(bids.fill_order(9, px(1), qty(1)), Err(err));
    }

    #[rstest]
    fn test_fill_reduces_then_removes(mut bids: Ladder) {
        bids.add_order(px(10_000), qty(5), 1, 1).unwrap();
        bids.fill_order(1, px(10_000), qty(2)).unwrap();
        assert_eq!(bids.order(1).unwrap().size, qty(3));

        assert_eq!(
            bids.fill_order(1, px(10_000), qty(4)),
            Err(BookError::Model(ModelError::Overflow { op: "fill" }))
        );
        assert_eq!(bids.order(1).unwrap().size, qty(3));

        bids.fill_order(1, px(10_000), qty(3)).unwrap();
        assert!(bids.is_empty());
        assert_eq!(bids.best_price(), Err(BookError::EmptyLadder { side: OrderSide::Buy }));
    }

    #[rstest]
    fn test_failed_move_leaves_ladder(mut bids: Ladder) {
        bids.add_order(px(10_000), qty(5), 1, 1).unwrap();
        bids.add_order(px(10_050), qty(5), 2, 2).unwrap();

        let odd = Quantity::from_raw(5, 3).unwrap();
        assert!(bids.update_order(1, px(10_050), odd, 3).is_err());
        assert_eq!(bids.order(1).unwrap().price, px(10_000));
        assert_eq!(bids.level(px(10_050)).unwrap().size(), qty(5));
        assert_eq!(bids.len(), 2);
    }

    #[test]
    fn test_l2_aggregates_by_price() {
        let mut bids = Ladder::new(OrderSide::Buy, BookType::L2Mbp);
        bids.add_order(px(10_000), qty(5), 11, 1).unwrap();
        bids.add_order(px(10_000), qty(3), 12, 2).unwrap();
        assert_eq!(bids.order_count(), 1);
        assert_eq!(bids.top().unwrap().size(), qty(8));

        // Absolute level size
        bids.update_order(0, px(10_000), qty(2), 3).unwrap();
        assert_eq!(bids.top().unwrap().size(), qty(2));

        assert!(bids.order_key(&px(10_050), 0).is_none());
        bids.delete_order_at(px(10_000), 99).unwrap();
        assert!(bids.is_empty());
        assert_eq!(
            bids.delete_order_at(px(10_000), 99).map(|_| ()),
            Err(BookError::NotFound {
                order_id: 99,
                side: OrderSide::Buy
            })
        );
    }

    #[test]
    fn test_l2_level_shared_across_precisions() {
        let mut bids = Ladder::new(OrderSide::Buy, BookType::L2Mbp);
        let coarse = Price::from_raw(1_000, 1).unwrap();
        let fine = Price::from_raw(10_000, 2).unwrap();
        bids.add_order(coarse, qty(5), 0, 1).unwrap();
        bids.add_order(fine, qty(3), 0, 2).unwrap();
        assert_eq!(bids.len(), 1);
        assert_eq!(bids.order_count(), 1);
        assert_eq!(bids.top().unwrap().size(), qty(8));

        bids.update_order(0, fine, qty(2), 3).unwrap();
        assert_eq!(bids.top().unwrap().size(), qty(2));
        assert_eq!(bids.order_count(), 1);

        bids.fill_order(0, coarse, qty(2)).unwrap();
        assert!(bids.is_empty());
    }

    #[test]
    fn test_l1_keeps_single_level() {
        let mut asks = Ladder::new(OrderSide::Sell, BookType::L1Tbbo);
        asks.add_order(px(10_100), qty(5), 1, 1).unwrap();
        asks.add_order(px(10_200), qty(2), 2, 2).unwrap();
        assert_eq!(asks.len(), 1);
        assert_eq!(asks.best_price().unwrap(), px(10_200));

        asks.update_order(3, px(10_150), qty(4), 3).unwrap();
        assert_eq!(asks.depth(5).collect::<Vec<_>>(), vec![(px(10_150), qty(4))]);

        asks.delete_order(42).unwrap();
        assert!(asks.is_empty());
    }

    #[rstest]
    fn test_depth_restartable_and_total(mut bids: Ladder) {
        for (i, raw) in [10_000, 9_990, 9_980].into_iter().enumerate() {
            let id = i as u64;
            bids.add_order(px(raw), qty(id + 1), id, id).unwrap();
        }
        let depth = bids.depth(10);
        assert_eq!(depth.len(), 3);
        let first: Vec<_> = depth.clone().collect();
        let second: Vec<_> = depth.collect();
        assert_eq!(first, second);
        assert_eq!(bids.total_quantity().unwrap(), Some(qty(6)));
        assert_eq!(bids.to_string(), "Ladder(BUY, 3 levels, 100.00x1, 99.90x2, 99.80x3)");
    }
}
