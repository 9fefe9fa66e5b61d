//! Fill table elements from row-major cell arrays.

use crate::models::FuelCatalog;

use super::dom::Element;

/// Append one `<tr>` per row and one `<td>` per cell, preserving order and text.
///
/// `[["A", "1"], ["B", "2"]]` gives
/// ```text
///  | A | 1 |
///  | B | 2 |
/// ```
/// Rows of different lengths are rendered as they are.
pub fn populate_table<R, C>(table: &mut Element, rows: R)
where
    R: IntoIterator,
    R::Item: IntoIterator<Item = C>,
    C: AsRef<str>,
{
    for row in rows {
        table.push(build_row(row, "td"));
    }
}

/// Same as [`populate_table`], with the first row rendered as `<th>` cells.
pub fn populate_table_with_header<R, C>(table: &mut Element, rows: R)
where
    R: IntoIterator,
    R::Item: IntoIterator<Item = C>,
    C: AsRef<str>,
{
    for (i, row) in rows.into_iter().enumerate() {
        table.push(build_row(row, if i == 0 { "th" } else { "td" }));
    }
}

fn build_row<I, C>(cells: I, cell_tag: &str) -> Element
where
    I: IntoIterator<Item = C>,
    C: AsRef<str>,
{
    let mut tr = Element::new("tr");
    for cell in cells {
        tr.push(Element::new(cell_tag).with_text(cell.as_ref()));
    }
    tr
}

/// Pair each fuel price with its display name, in catalog order.
/// Fuels without a price are dropped.
pub fn map_prices_to_names(prices: &[Option<f64>], names: &FuelCatalog) -> Vec<(String, f64)> {
    names
        .iter()
        .zip(prices)
        .filter_map(|(f, p)| p.map(|p| (f.name.clone(), p)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_texts(table: &Element) -> Vec<Vec<String>> {
        table
            .elements()
            .map(|tr| tr.elements().map(|td| td.text_content()).collect())
            .collect()
    }

    #[test]
    fn appends_rows_in_order() {
        let mut table = Element::new("table");
        populate_table(&mut table, [["X", "1"], ["Y", "2"]]);
        assert_eq!(table.elements().count(), 2);
        assert_eq!(cell_texts(&table), vec![vec!["X", "1"], vec!["Y", "2"]]);
        assert!(table.elements().all(|tr| tr.elements().all(|c| c.tag == "td")));
    }

    #[test]
    fn ragged_rows_kept_as_is() {
        let mut table = Element::new("table");
        populate_table(&mut table, vec![vec!["a"], vec!["b", "c", "d"]]);
        assert_eq!(cell_texts(&table)[0].len(), 1);
        assert_eq!(cell_texts(&table)[1].len(), 3);
    }

    #[test]
    fn header_row_uses_th() {
        let mut table = Element::new("table");
        populate_table_with_header(&mut table, [["Carburant", "Prix"], ["Gazole", "1.8"]]);
        let rows: Vec<&Element> = table.elements().collect();
        assert!(rows[0].elements().all(|c| c.tag == "th"));
        assert!(rows[1].elements().all(|c| c.tag == "td"));
    }

    #[test]
    fn prices_zip_with_names() {
        let names = FuelCatalog::from_pairs([("1", "Gazole"), ("2", "SP95"), ("3", "E85")]);
        let got = map_prices_to_names(&[Some(1.8), None, Some(0.9)], &names);
        assert_eq!(got, vec![("Gazole".to_string(), 1.8), ("E85".to_string(), 0.9)]);
    }
}
