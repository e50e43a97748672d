use gameshelf_core::{Field, Game, GameDraft, ValidationErrors};

const MAX_INPUT_LEN: usize = 256;

/// Single-line text input with a character cursor.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.chars().count();
        Self { value, cursor }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        self.set(String::new());
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.value.chars().count() as isize;
        let next = (self.cursor as isize + delta).clamp(0, len);
        self.cursor = next as usize;
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    pub fn insert(&mut self, ch: char) {
        if ch.is_control() || self.value.chars().count() >= MAX_INPUT_LEN {
            return;
        }
        let at = self.byte_index(self.cursor);
        self.value.insert(at, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.value.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }

    fn byte_index(&self, chars: usize) -> usize {
        self.value
            .char_indices()
            .nth(chars)
            .map(|(index, _)| index)
            .unwrap_or(self.value.len())
    }
}

/// Identifies one opening of a form, so late file reads find their way back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormTicket {
    generation: u64,
    editing: Option<String>,
}

/// Add/edit form over the five game fields.
#[derive(Debug, Clone)]
pub struct GameForm {
    editing: Option<String>,
    generation: u64,
    inputs: Vec<TextInput>,
    focus: usize,
    errors: Option<ValidationErrors>,
}

impl GameForm {
    pub fn new_game() -> Self {
        Self::from_draft(None, GameDraft::default())
    }

    pub fn edit(game: &Game) -> Self {
        Self::from_draft(Some(game.id.clone()), game.draft())
    }

    fn from_draft(editing: Option<String>, draft: GameDraft) -> Self {
        let inputs = Field::ALL
            .iter()
            .map(|field| TextInput::new(draft.field(*field)))
            .collect();
        Self {
            editing,
            generation: 0,
            inputs,
            focus: 0,
            errors: None,
        }
    }

    /// Stamp the form with the opening counter of its owner.
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub fn ticket(&self) -> FormTicket {
        FormTicket {
            generation: self.generation,
            editing: self.editing.clone(),
        }
    }

    /// True when `ticket` was issued by this very form.
    pub fn accepts(&self, ticket: &FormTicket) -> bool {
        ticket.generation == self.generation && ticket.editing == self.editing
    }

    /// Id of the record being edited, `None` for a new record.
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn title(&self) -> &'static str {
        if self.editing.is_some() {
            "Edit Game"
        } else {
            "Add Game"
        }
    }

    pub fn focused_field(&self) -> Field {
        Field::ALL[self.focus]
    }

    pub fn input(&self, field: Field) -> &TextInput {
        &self.inputs[field_index(field)]
    }

    pub fn focused_input_mut(&mut self) -> &mut TextInput {
        let index = self.focus;
        &mut self.inputs[index]
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.inputs.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + self.inputs.len() - 1) % self.inputs.len();
    }

    pub fn set_image(&mut self, value: String) {
        self.inputs[field_index(Field::Image)].set(value);
        self.clear_error(Field::Image);
    }

    pub fn error(&self, field: Field) -> Option<&'static str> {
        self.errors.as_ref().and_then(|errors| errors.message(field))
    }

    /// Key input for the focused field. An embedded image is replaced rather than edited.
    pub fn insert(&mut self, ch: char) {
        if self.focused_field() == Field::Image && is_data_uri(self.input(Field::Image).value()) {
            self.focused_input_mut().clear();
        }
        self.focused_input_mut().insert(ch);
    }

    pub fn backspace(&mut self) {
        if self.focused_field() == Field::Image && is_data_uri(self.input(Field::Image).value()) {
            self.focused_input_mut().clear();
        } else {
            self.focused_input_mut().backspace();
        }
    }

    pub fn draft(&self) -> GameDraft {
        let mut draft = GameDraft::default();
        for field in Field::ALL {
            let value = self.input(field).value();
            *draft.field_mut(field) = if field == Field::Image {
                value.to_string()
            } else {
                value.trim().to_string()
            };
        }
        draft
    }

    /// Validate the current values, remembering per-field messages on failure.
    pub fn submit(&mut self) -> Option<GameDraft> {
        let draft = self.draft();
        match draft.validate() {
            Ok(()) => {
                self.errors = None;
                Some(draft)
            }
            Err(errors) => {
                if let Some(first) = errors.fields().next() {
                    self.focus = field_index(first);
                }
                self.errors = Some(errors);
                None
            }
        }
    }

    fn clear_error(&mut self, field: Field) {
        let Some(errors) = self.errors.as_ref() else {
            return;
        };
        if errors.message(field).is_some() {
            let draft = self.draft();
            self.errors = draft.validate().err();
        }
    }
}

fn field_index(field: Field) -> usize {
    Field::ALL
        .iter()
        .position(|candidate| *candidate == field)
        .unwrap_or(0)
}

pub fn is_data_uri(value: &str) -> bool {
    value.starts_with("data:")
}

/// Short description of an image value for display.
pub fn describe_image(value: &str) -> String {
    if let Some(rest) = value.strip_prefix("data:") {
        let mime = rest.split([';', ',']).next().unwrap_or("unknown");
        let payload = rest.split_once(',').map(|(_, data)| data.len()).unwrap_or(0);
        format!("[embedded {mime}, ~{} KiB]", (payload * 3 / 4).div_ceil(1024))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_input_handles_multibyte_characters() {
        let mut input = TextInput::new("Pokmon");
        input.move_cursor(-3);
        input.insert('é');
        assert_eq!(input.value(), "Pokémon");
        input.backspace();
        input.delete();
        assert_eq!(input.value(), "Pokon");
        input.move_home();
        input.backspace();
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn submit_reports_first_invalid_field() {
        let mut form = GameForm::new_game();
        form.insert('Z');
        assert!(form.submit().is_none());
        assert_eq!(form.focused_field(), Field::Category);
        assert_eq!(form.error(Field::Name), None);
        assert_eq!(form.error(Field::Year), Some("year must be four digits"));
    }

    #[test]
    fn edit_form_round_trips_draft() {
        let game = Game::from_draft(
            "id-1",
            GameDraft {
                name: "Zelda".into(),
                category: "Action".into(),
                year: "1986".into(),
                producer: "Nintendo".into(),
                image: "data:image/png;base64,AAAA".into(),
            },
        );
        let mut form = GameForm::edit(&game);
        assert_eq!(form.editing(), Some("id-1"));
        assert_eq!(form.submit(), Some(game.draft()));
    }

    #[test]
    fn typing_over_embedded_image_replaces_it() {
        let mut form = GameForm::new_game();
        form.set_image("data:image/png;base64,AAAA".into());
        for _ in 0..4 {
            form.focus_next();
        }
        assert_eq!(form.focused_field(), Field::Image);
        form.insert('x');
        assert_eq!(form.input(Field::Image).value(), "x");
    }

    #[test]
    fn tickets_match_only_their_own_form() {
        let game = Game::from_draft(
            "id-1",
            GameDraft {
                name: "Zelda".into(),
                category: "Action".into(),
                year: "1986".into(),
                producer: "Nintendo".into(),
                image: "zelda.png".into(),
            },
        );
        let first = GameForm::new_game().with_generation(1);
        let second = GameForm::new_game().with_generation(2);
        let editing = GameForm::edit(&game).with_generation(2);

        assert!(first.accepts(&first.ticket()));
        assert!(!second.accepts(&first.ticket()));
        assert!(!editing.accepts(&second.ticket()));
        assert!(!second.accepts(&editing.ticket()));
    }

    #[test]
    fn describes_embedded_images() {
        assert_eq!(
            describe_image("data:image/png;base64,AAAA"),
            "[embedded image/png, ~1 KiB]"
        );
        assert_eq!(describe_image("cover.png"), "cover.png");
    }
}
