use sentinel_archiver::domain::ProductLevel;
use sentinel_archiver::parser::FeedParser;

const FEED: &str = "<feed>\n\
    <entry>\n\
    <title>S2A_MSIL1C_CLEAR</title>\n\
    <id>id-clear</id>\n\
    <double name=\"cloudcoverpercentage\">10.0</double>\n\
    </entry>\n\
    <entry>\n\
    <title>S2A_MSIL1C_CLOUDY</title>\n\
    <id>id-cloudy</id>\n\
    <double name=\"cloudcoverpercentage\">90.0</double>\n\
    </entry>\n\
    </feed>\n";

#[test]
fn threshold_keeps_only_the_clear_entry() {
    let products = FeedParser::new(ProductLevel::L1C, 50.0).parse(FEED);
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "S2A_MSIL1C_CLEAR");
    assert_eq!(products[0].id, "id-clear");
    assert_eq!(products[0].clouds_percentage, Some(10.0));
}
