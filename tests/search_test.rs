//! Integration tests for query compilation and search execution.

use glaive::error::Result;
use glaive::index::Index;
use glaive::mapping::IndexMapping;
use glaive::query::*;
use glaive::search::{FacetRequest, HighlightRequest, SearchRequest};
use serde_json::json;

fn sample_index() -> Result<Index> {
    let index = Index::new_memory_only(IndexMapping::new())?;
    let docs = [
        (
            "1",
            json!({
                "title": "The quick brown fox",
                "body": "jumps over the lazy dog",
                "category": "animal",
                "price": 10,
                "created": "2014-11-01"
            }),
        ),
        (
            "2",
            json!({
                "title": "A lazy afternoon",
                "body": "nothing much happens",
                "category": "leisure",
                "price": 25,
                "created": "2015-03-10"
            }),
        ),
        (
            "3",
            json!({
                "title": "Brown bears and foxes",
                "body": "a field guide",
                "category": "animal",
                "price": 40,
                "created": "2016-07-21"
            }),
        ),
    ];
    for (id, doc) in docs {
        index.index(id, &doc.into())?;
    }
    Ok(index)
}

fn hit_ids(index: &Index, query: Query) -> Result<Vec<String>> {
    let result = index.search(&SearchRequest::new(query))?;
    let mut ids: Vec<String> = result.hits.into_iter().map(|h| h.id).collect();
    ids.sort();
    Ok(ids)
}

#[test]
fn test_match_uses_default_field() -> Result<()> {
    let index = sample_index()?;
    assert_eq!(hit_ids(&index, MatchQuery::new("lazy").into())?, vec!["1", "2"]);
    assert_eq!(
        hit_ids(&index, MatchQuery::new("lazy").with_field("title").into())?,
        vec!["2"]
    );
    Ok(())
}

#[test]
fn test_match_with_only_stop_words_matches_nothing() -> Result<()> {
    let index = sample_index()?;
    let result = index.search(&SearchRequest::new(MatchQuery::new("the and a").into()))?;
    assert_eq!(result.total, 0);
    Ok(())
}

#[test]
fn test_match_phrase() -> Result<()> {
    let index = sample_index()?;
    let query = MatchPhraseQuery::new("quick brown").with_field("title");
    assert_eq!(hit_ids(&index, query.into())?, vec!["1"]);

    let query = MatchPhraseQuery::new("brown quick").with_field("title");
    assert!(hit_ids(&index, query.into())?.is_empty());
    Ok(())
}

#[test]
fn test_term_level_queries() -> Result<()> {
    let index = sample_index()?;
    assert_eq!(
        hit_ids(&index, TermQuery::new("brown").with_field("title").into())?,
        vec!["1", "3"]
    );
    assert_eq!(
        hit_ids(&index, PrefixQuery::new("fox").with_field("title").into())?,
        vec!["1", "3"]
    );
    assert_eq!(
        hit_ids(&index, RegexpQuery::new("fox(es)?").with_field("title").into())?,
        vec!["1", "3"]
    );
    assert_eq!(
        hit_ids(&index, FuzzyQuery::new("laxy").with_field("title").into())?,
        vec!["2"]
    );
    Ok(())
}

#[test]
fn test_numeric_and_date_ranges() -> Result<()> {
    let index = sample_index()?;
    let query = NumericRangeQuery::new(Some(10.0), Some(40.0)).with_field("price");
    assert_eq!(hit_ids(&index, query.into())?, vec!["1", "2"]);

    let query = NumericRangeQuery::new_inclusive(Some(10.0), Some(40.0), false, true)
        .with_field("price");
    assert_eq!(hit_ids(&index, query.into())?, vec!["2", "3"]);

    let query = DateRangeQuery::new(Some("2015-01-01"), None).with_field("created");
    assert_eq!(hit_ids(&index, query.into())?, vec!["2", "3"]);

    let query = DateRangeQuery::new(None, Some("2015-03-10"))
        .with_field("created")
        .with_inclusive(true, true);
    assert_eq!(hit_ids(&index, query.into())?, vec!["1", "2"]);
    Ok(())
}

#[test]
fn test_boolean_and_disjunction_min() -> Result<()> {
    let index = sample_index()?;

    let mut query = BooleanQuery::default();
    query.add_must(MatchQuery::new("animal").with_field("category"));
    query.add_must_not(TermQuery::new("lazy").with_field("body"));
    assert_eq!(hit_ids(&index, query.into())?, vec!["3"]);

    let mut only_not = BooleanQuery::default();
    only_not.add_must_not(TermQuery::new("animal").with_field("category"));
    assert_eq!(hit_ids(&index, only_not.into())?, vec!["2"]);

    let two_of = DisjunctionQuery::new(vec![
        TermQuery::new("brown").with_field("title").into(),
        TermQuery::new("fox").with_field("title").into(),
        TermQuery::new("lazy").with_field("title").into(),
    ])
    .with_min(2.0);
    assert_eq!(hit_ids(&index, two_of.into())?, vec!["1"]);
    Ok(())
}

#[test]
fn test_invalid_query_is_rejected_before_search() -> Result<()> {
    let index = sample_index()?;
    let query = DisjunctionQuery::new(vec![TermQuery::new("a").into()]).with_min(4.0);
    assert!(index.search(&SearchRequest::new(query.into())).is_err());
    assert_eq!(index.stats().searches(), 0);
    Ok(())
}

#[test]
fn test_doc_id_query_scopes_results() -> Result<()> {
    let index = sample_index()?;
    let query = ConjunctionQuery::new(vec![
        DocIdQuery::new(["1", "2", "missing"]).into(),
        MatchQuery::new("lazy").into(),
    ]);
    assert_eq!(hit_ids(&index, query.into())?, vec!["1", "2"]);
    Ok(())
}

#[test]
fn test_query_string_search() -> Result<()> {
    let index = sample_index()?;
    let query = QueryStringQuery::new("+category:animal -title:bears price>=5");
    assert_eq!(hit_ids(&index, query.into())?, vec!["1"]);

    let query = QueryStringQuery::new(r#"title:"quick brown" title:afternoon"#);
    assert_eq!(hit_ids(&index, query.into())?, vec!["1", "2"]);
    Ok(())
}

#[test]
fn test_paging_and_scores() -> Result<()> {
    let index = sample_index()?;
    let all = index.search(&SearchRequest::new(MatchAllQuery::new().into()).with_size(2))?;
    assert_eq!(all.total, 3);
    assert_eq!(all.hits.len(), 2);

    let rest = index.search(
        &SearchRequest::new(MatchAllQuery::new().into())
            .with_size(2)
            .with_from(2),
    )?;
    assert_eq!(rest.hits.len(), 1);
    assert!(rest.hits.iter().all(|h| !all.hits.iter().any(|a| a.id == h.id)));

    let unbounded = index.search(
        &SearchRequest::new(MatchAllQuery::new().into())
            .with_size(usize::MAX)
            .with_from(1),
    )?;
    assert_eq!(unbounded.total, 3);
    assert_eq!(unbounded.hits.len(), 2);

    let result = index.search(&SearchRequest::new(MatchQuery::new("brown fox").into()))?;
    assert_eq!(result.hits[0].id, "1");
    assert!(result.max_score >= result.hits[0].score);
    assert!(result.hits.iter().all(|h| h.index == index.name()));
    Ok(())
}

#[test]
fn test_facets() -> Result<()> {
    let index = sample_index()?;
    let mut request = SearchRequest::new(MatchAllQuery::new().into());
    request.add_facet("categories", FacetRequest::new("category", 5));

    let mut prices = FacetRequest::new("price", 5);
    prices.add_numeric_range("cheap", None, Some(20.0));
    prices.add_numeric_range("expensive", Some(20.0), None);
    request.add_facet("prices", prices);

    let mut created = FacetRequest::new("created", 5);
    created.add_date_range("old", None, Some("2015-01-01"));
    created.add_date_range("new", Some("2015-01-01"), None);
    request.add_facet("created", created);

    let result = index.search(&request)?;

    let categories = &result.facets["categories"];
    assert_eq!(categories.terms[0].term, "animal");
    assert_eq!(categories.terms[0].count, 2);

    let prices = &result.facets["prices"];
    let count = |name: &str| {
        prices
            .numeric_ranges
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.count)
    };
    assert_eq!(count("cheap"), Some(1));
    assert_eq!(count("expensive"), Some(2));

    let created = &result.facets["created"];
    let count = |name: &str| {
        created
            .date_ranges
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.count)
    };
    assert_eq!(count("old"), Some(1));
    assert_eq!(count("new"), Some(2));
    Ok(())
}

#[test]
fn test_highlight_and_stored_fields() -> Result<()> {
    let index = sample_index()?;
    let mut highlight = HighlightRequest::new();
    highlight.add_field("title");
    let request = SearchRequest::new(MatchQuery::new("quick").with_field("title").into())
        .with_highlight(highlight)
        .with_fields(vec!["title".to_string(), "price".to_string()]);

    let result = index.search(&request)?;
    assert_eq!(result.hits.len(), 1);
    let hit = &result.hits[0];
    let fragments = &hit.fragments["title"];
    assert!(fragments[0].contains("<mark>quick</mark>"));
    assert_eq!(hit.fields["title"], json!("The quick brown fox"));
    assert_eq!(hit.fields["price"], json!(10.0));
    assert!(!hit.fields.contains_key("body"));

    let request = SearchRequest::new(MatchQuery::new("quick").with_field("title").into())
        .with_fields(vec!["*".to_string()]);
    let result = index.search(&request)?;
    let hit = &result.hits[0];
    assert_eq!(hit.fields["body"], json!("jumps over the lazy dog"));
    assert!(hit.fields["created"].as_str().is_some_and(|s| s.starts_with("2014-11-01")));
    Ok(())
}

#[test]
fn test_unknown_highlighter_is_an_error() -> Result<()> {
    let index = sample_index()?;
    let request = SearchRequest::new(MatchAllQuery::new().into())
        .with_highlight(HighlightRequest::with_style("sparkles"));
    assert!(index.search(&request).is_err());
    Ok(())
}

#[test]
fn test_search_counts_in_stats() -> Result<()> {
    let index = sample_index()?;
    index.search(&SearchRequest::new(MatchAllQuery::new().into()))?;
    index.search(&SearchRequest::new(MatchAllQuery::new().into()))?;
    assert_eq!(index.stats().searches(), 2);
    assert_eq!(index.stats_map()["searches"], 2);
    Ok(())
}
