use memory_insights_schemas::{MemoryRecord, QualityAggregate};

/// Reduce a record set into its sunny/cloudy aggregate.
///
/// Good facts count as sunny moments and hard truths as cloudy ones; lessons
/// are ignored. An empty input yields [`QualityAggregate::EMPTY`].
pub fn aggregate<'a, I>(records: I) -> QualityAggregate
where
    I: IntoIterator<Item = &'a MemoryRecord>,
{
    let (sunny, cloudy) = records.into_iter().fold((0u64, 0u64), |(sunny, cloudy), record| {
        (
            sunny + u64::from(record.good_fact_count),
            cloudy + u64::from(record.hard_truth_count),
        )
    });

    QualityAggregate::from_counts(sunny, cloudy)
}

/// Sum several aggregates, e.g. every entity of a sphere into one sphere total
pub fn sum_aggregates<'a, I>(aggregates: I) -> QualityAggregate
where
    I: IntoIterator<Item = &'a QualityAggregate>,
{
    aggregates
        .into_iter()
        .fold(QualityAggregate::EMPTY, |acc, agg| acc.combine(agg))
}
