/// View targets and the two renderers (display panel, table view)
///
/// Each channel owns a fixed set of write-only elements. The renderers take an
/// ordered list of [`ChannelView`] handles and push formatted text into any
/// [`ViewSink`]; nothing is written unless the whole frame can be rendered.

use std::collections::HashMap;

use super::error::PollError;
use super::measurement::{to_fixed, ChannelReading, Reading, NUM_OF_CHANNELS_TO_DISPLAY};

/// Kind of value an element shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    DisplayTemp,
    DisplayTitle,
    DisplayProbe,
    Channel,
    Probe,
    TempC,
    TempF,
    TempK,
    Resistance,
}

impl Field {
    fn dom_prefix(self) -> &'static str {
        match self {
            Field::DisplayTemp => "tempdisplay-temp",
            Field::DisplayTitle => "tempdisplay-title",
            Field::DisplayProbe => "tempdisplay-probe",
            Field::Channel => "channel",
            Field::Probe => "probe",
            Field::TempC => "tempc",
            Field::TempF => "tempf",
            Field::TempK => "tempk",
            Field::Resistance => "resistance",
        }
    }
}

/// Handle to one write-only view element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Element {
    channel: usize,
    field: Field,
}

impl Element {
    pub const fn new(channel: usize, field: Field) -> Self {
        Self { channel, field }
    }

    /// Zero-based channel index
    pub fn channel(&self) -> usize {
        self.channel
    }

    /// Id used by the web dashboard, e.g. `tempdisplay-temp1`
    pub fn dom_id(&self) -> String {
        format!("{}{}", self.field.dom_prefix(), self.channel + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayTargets {
    pub temp: Element,
    pub title: Element,
    pub probe: Element,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableTargets {
    pub channel: Element,
    pub probe: Element,
    pub temp_c: Element,
    pub temp_f: Element,
    pub temp_k: Element,
    pub resistance: Element,
}

/// All elements belonging to one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelView {
    pub display: DisplayTargets,
    pub table: TableTargets,
}

impl ChannelView {
    pub const fn new(channel: usize) -> Self {
        Self {
            display: DisplayTargets {
                temp: Element::new(channel, Field::DisplayTemp),
                title: Element::new(channel, Field::DisplayTitle),
                probe: Element::new(channel, Field::DisplayProbe),
            },
            table: TableTargets {
                channel: Element::new(channel, Field::Channel),
                probe: Element::new(channel, Field::Probe),
                temp_c: Element::new(channel, Field::TempC),
                temp_f: Element::new(channel, Field::TempF),
                temp_k: Element::new(channel, Field::TempK),
                resistance: Element::new(channel, Field::Resistance),
            },
        }
    }
}

/// The displayed channels, in order
pub fn channel_views() -> [ChannelView; NUM_OF_CHANNELS_TO_DISPLAY] {
    std::array::from_fn(ChannelView::new)
}

/// Destination of rendered text
#[cfg_attr(test, mockall::automock)]
pub trait ViewSink {
    fn write(&mut self, element: Element, text: String);
}

/// Writes collected during one render pass, applied later in order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewBatch {
    writes: Vec<(Element, String)>,
}

impl ViewBatch {
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Element, String)> {
        self.writes.iter()
    }

    pub fn apply(self, sink: &mut impl ViewSink) {
        for (element, text) in self.writes {
            sink.write(element, text);
        }
    }
}

impl ViewSink for ViewBatch {
    fn write(&mut self, element: Element, text: String) {
        self.writes.push((element, text));
    }
}

/// Last text written to each element
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    cells: HashMap<Element, String>,
}

impl ViewState {
    pub fn text(&self, element: Element) -> Option<&str> {
        self.cells.get(&element).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl ViewSink for ViewState {
    fn write(&mut self, element: Element, text: String) {
        self.cells.insert(element, text);
    }
}

/// Celsius for the display panel: `"21.50°C"`
pub fn display_temperature(reading: Reading) -> String {
    format!("{}°C", to_fixed(reading.value(), 2))
}

/// Numeric cell of the table view: `"21.500"`
pub fn table_value(reading: Reading) -> String {
    to_fixed(reading.value(), 3)
}

fn ensure_complete(frame: &[ChannelReading], views: &[ChannelView]) -> Result<(), PollError> {
    if frame.len() < views.len() {
        return Err(PollError::ShortFrame {
            expected: views.len(),
            got: frame.len(),
        });
    }
    Ok(())
}

/// Rounded Celsius, label and probe for each displayed channel
pub fn render_display_panel(
    frame: &[ChannelReading],
    views: &[ChannelView],
    sink: &mut impl ViewSink,
) -> Result<(), PollError> {
    ensure_complete(frame, views)?;

    for (view, reading) in views.iter().zip(frame) {
        let Some(record) = reading.record() else {
            continue;
        };
        let targets = &view.display;
        sink.write(targets.temp, display_temperature(record.temperature_c));
        sink.write(targets.title, record.verbose_name.clone());
        sink.write(targets.probe, record.probe.clone());
    }

    Ok(())
}

/// Name, probe, C/F/K and resistance for each displayed channel
pub fn render_table(
    frame: &[ChannelReading],
    views: &[ChannelView],
    sink: &mut impl ViewSink,
) -> Result<(), PollError> {
    ensure_complete(frame, views)?;

    for (view, reading) in views.iter().zip(frame) {
        let Some(record) = reading.record() else {
            continue;
        };
        let targets = &view.table;
        sink.write(targets.channel, record.name.clone());
        sink.write(targets.probe, record.probe.clone());
        sink.write(targets.temp_c, table_value(record.temperature_c));
        sink.write(targets.temp_f, table_value(record.temperature_f));
        sink.write(targets.temp_k, table_value(record.temperature_k));
        sink.write(targets.resistance, table_value(record.resistance_ohm));
    }

    Ok(())
}

/// Both views, or nothing at all when the frame is short
pub fn render_measurements(
    frame: &[ChannelReading],
    views: &[ChannelView],
    sink: &mut impl ViewSink,
) -> Result<(), PollError> {
    ensure_complete(frame, views)?;
    render_display_panel(frame, views, sink)?;
    render_table(frame, views, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::measurement::{parse_frame, MeasurementRecord};
    use mockall::predicate::eq;

    fn record(index: usize, celsius: f64) -> ChannelReading {
        ChannelReading::Measured(MeasurementRecord {
            name: format!("CH{}", index),
            verbose_name: format!("Probe {}", index + 1),
            probe: "Pt100".to_string(),
            temperature_c: Reading::new(celsius),
            temperature_f: Reading::new(celsius * 9.0 / 5.0 + 32.0),
            temperature_k: Reading::new(celsius + 273.15),
            resistance_ohm: Reading::new(100.0 + celsius * 0.4),
            avg_reading: None,
        })
    }

    fn frame(len: usize) -> Vec<ChannelReading> {
        (0..len).map(|i| record(i, 20.0 + i as f64)).collect()
    }

    #[test]
    fn test_dom_ids() {
        let views = channel_views();
        assert_eq!(views[0].display.temp.dom_id(), "tempdisplay-temp1");
        assert_eq!(views[1].display.title.dom_id(), "tempdisplay-title2");
        assert_eq!(views[2].display.probe.dom_id(), "tempdisplay-probe3");
        assert_eq!(views[0].table.channel.dom_id(), "channel1");
        assert_eq!(views[2].table.resistance.dom_id(), "resistance3");
        assert_eq!(views[1].table.temp_k.dom_id(), "tempk2");
    }

    #[test]
    fn test_display_panel_string_celsius() {
        let body = r#"[
            {"_name": "CH0", "verbose_name": "Tank", "probe": "Pt100", "temperature_C": "21.5",
             "temperature_F": "70.7", "temperature_K": "294.65", "resistance_Om": "108.4"},
            {}, {}
        ]"#;
        let frame = parse_frame(body).unwrap();
        let views = channel_views();
        let mut state = ViewState::default();

        render_display_panel(&frame, &views, &mut state).unwrap();

        assert_eq!(state.text(views[0].display.temp), Some("21.50°C"));
        assert_eq!(state.text(views[0].display.title), Some("Tank"));
        assert_eq!(state.text(views[0].display.probe), Some("Pt100"));
        assert_eq!(state.text(views[1].display.temp), None);
    }

    #[test]
    fn test_table_numeric_celsius() {
        let frame = vec![record(0, 21.5), record(1, -5.0), record(2, 100.0)];
        let views = channel_views();
        let mut state = ViewState::default();

        render_table(&frame, &views, &mut state).unwrap();

        assert_eq!(state.text(views[0].table.temp_c), Some("21.500"));
        assert_eq!(state.text(views[0].table.temp_f), Some("70.700"));
        assert_eq!(state.text(views[0].table.temp_k), Some("294.650"));
        assert_eq!(state.text(views[0].table.resistance), Some("108.600"));
        assert_eq!(state.text(views[1].table.temp_c), Some("-5.000"));
        assert_eq!(state.text(views[2].table.channel), Some("CH2"));
        assert_eq!(state.text(views[2].table.probe), Some("Pt100"));
    }

    #[test]
    fn test_only_first_three_channels_rendered() {
        let frame = frame(5);
        let views = channel_views();
        let mut batch = ViewBatch::default();

        render_measurements(&frame, &views, &mut batch).unwrap();

        // 3 display + 6 table elements per channel
        assert_eq!(batch.len(), 3 * 9);
        assert!(batch.iter().all(|(element, _)| element.channel() < 3));
    }

    #[test]
    fn test_short_frame_writes_nothing() {
        let mut sink = MockViewSink::new();
        sink.expect_write().times(0);

        let err = render_measurements(&frame(2), &channel_views(), &mut sink).unwrap_err();
        assert!(matches!(err, PollError::ShortFrame { expected: 3, got: 2 }));
    }

    #[test]
    fn test_display_panel_writes_per_channel() {
        let views = channel_views();
        let mut sink = MockViewSink::new();
        sink.expect_write()
            .with(eq(views[1].display.temp), eq("21.00°C".to_string()))
            .times(1)
            .return_const(());
        let target = views[1].display.temp;
        sink.expect_write()
            .withf(move |element, _| *element != target)
            .times(8)
            .return_const(());

        render_display_panel(&frame(3), &views, &mut sink).unwrap();
    }

    #[test]
    fn test_pending_channel_skipped() {
        let mut frame = frame(3);
        frame[1] = ChannelReading::Pending;
        let views = channel_views();
        let mut batch = ViewBatch::default();

        render_measurements(&frame, &views, &mut batch).unwrap();

        assert_eq!(batch.len(), 2 * 9);
        assert!(batch.iter().all(|(element, _)| element.channel() != 1));
    }

    #[test]
    fn test_batch_apply_keeps_order() {
        let views = channel_views();
        let mut batch = ViewBatch::default();
        batch.write(views[0].table.temp_c, "1.000".to_string());
        batch.write(views[0].table.temp_c, "2.000".to_string());

        let mut state = ViewState::default();
        batch.apply(&mut state);
        assert_eq!(state.text(views[0].table.temp_c), Some("2.000"));
    }
}
