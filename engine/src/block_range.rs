use indexer_db::Layer;

use crate::{error::AppError, store::BlockBounds};

/// Inclusive block range, validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub from_block: i64,
    pub to_block: i64,
}

impl BlockRange {
    pub fn new(from_block: i64, to_block: i64) -> Result<Self, AppError> {
        if from_block < 0 || to_block < 0 {
            return Err(AppError::InvalidInput(format!(
                "block numbers must be non-negative, got [{from_block}, {to_block}]"
            )));
        }
        if from_block > to_block {
            return Err(AppError::InvalidInput(format!(
                "from_block ({from_block}) must be <= to_block ({to_block})"
            )));
        }

        Ok(Self {
            from_block,
            to_block,
        })
    }

    #[cfg(test)]
    pub fn contains(&self, block_number: i64) -> bool {
        (self.from_block..=self.to_block).contains(&block_number)
    }

    /// Consecutive sub-ranges of at most `size` blocks covering `self`.
    pub fn chunks(&self, size: u64) -> impl Iterator<Item = BlockRange> {
        let step = i64::try_from(size.max(1)).unwrap_or(i64::MAX);
        let to_block = self.to_block;
        let mut next = Some(self.from_block);

        std::iter::from_fn(move || {
            let from_block = next?;
            let end = from_block.saturating_add(step - 1).min(to_block);
            next = (end < to_block).then_some(end + 1);

            Some(BlockRange {
                from_block,
                to_block: end,
            })
        })
    }
}

impl std::fmt::Display for BlockRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.from_block, self.to_block)
    }
}

/// Which end of a range a selector is parsed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    From,
    To,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSelector {
    Number(i64),
    Earliest,
    Latest,
}

impl BlockSelector {
    /// Accepts an integer, the empty string, or the sentinel word for the
    /// given side (`earliest` for `From`, `latest` for `To`). Case and
    /// surrounding whitespace are ignored.
    pub fn parse(raw: &str, bound: Bound) -> Result<Self, AppError> {
        let normalized = raw.trim().to_ascii_lowercase();

        match (normalized.as_str(), bound) {
            ("", Bound::From) | ("earliest", Bound::From) => Ok(BlockSelector::Earliest),
            ("", Bound::To) | ("latest", Bound::To) => Ok(BlockSelector::Latest),
            (value, _) => match value.parse::<i64>() {
                Ok(number) if number >= 0 => Ok(BlockSelector::Number(number)),
                _ => Err(AppError::InvalidInput(format!(
                    "unsupported {} block selector: `{raw}`",
                    match bound {
                        Bound::From => "from",
                        Bound::To => "to",
                    }
                ))),
            },
        }
    }
}

pub fn require_positive_chain_id(chain_id: i64) -> Result<i32, AppError> {
    i32::try_from(chain_id)
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::InvalidInput(format!("chain_id must be a positive integer, got {chain_id}")))
}

/// Resolve both selectors against `layer`. Two concrete numbers never touch
/// storage; otherwise the layer's block extrema for `chain_id` fill in the
/// sentinels.
pub async fn resolve_block_range<S>(
    store: &S,
    chain_id: i32,
    from: BlockSelector,
    to: BlockSelector,
    layer: Layer,
) -> Result<BlockRange, AppError>
where
    S: BlockBounds + ?Sized,
{
    if let (BlockSelector::Number(from_block), BlockSelector::Number(to_block)) = (from, to) {
        return BlockRange::new(from_block, to_block);
    }

    let (min_block, max_block) = store
        .block_bounds(chain_id, layer)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no rows in {layer} for chain_id={chain_id}")))?;

    let pick = |selector: BlockSelector| match selector {
        BlockSelector::Number(number) => number,
        BlockSelector::Earliest => min_block,
        BlockSelector::Latest => max_block,
    };

    let range = BlockRange::new(pick(from), pick(to))?;
    tracing::debug!(chain_id, %layer, %range, "Resolved block range");

    Ok(range)
}
