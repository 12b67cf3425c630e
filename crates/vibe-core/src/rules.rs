//! Markdown schema markers and the fixed text blocks built around them.

pub const TITLE: &str = "# SYSTEM ARCHITECTURE SPECIFICATION";
pub const OVERVIEW_HEADING: &str = "## 1. ARCHITECTURE OVERVIEW";
pub const CONNECTIONS_HEADING: &str = "## 2. DATA FLOW & CONNECTIONS";

pub const PROJECT_CONTEXT_MARKER: &str = "**Project Context / Goal:**";
pub const VISUAL_STYLE_MARKER: &str = "**Visual Style:**";

pub const ROUTES_KEY: &str = "API Routes / Endpoints";
pub const DATA_MODELS_KEY: &str = "Data Models / Schema";
pub const TABLE_PREFIX: &str = "Table/Model:";
pub const SENDS_DATA_TO: &str = "sends data to";

/// Structure rules an assistant must follow when editing the document.
/// Embedded verbatim in every edit prompt.
pub const RULES: &str = r#"**CRITICAL: You MUST preserve the existing Markdown structure exactly so it can be parsed programmatically.**

**Structure Rules:**
1.  **Sections:** Keep `## 1. ARCHITECTURE OVERVIEW` and `## 2. DATA FLOW & CONNECTIONS`.
2.  **Nodes:** Use `### [Name]` for each component.
3.  **Properties:** Use `- **Key:** Value` (Keys: Type (frontend,backend,database,cloud,custom), Technology, Port, Description).
4.  **Routes:** Must be listed under `- **API Routes / Endpoints:**`.
    *   Format: `  - **METHOD(GET,POST,PUT,PATCH,DELETE,CRUD)** `/path` - Description`
5.  **Data Models:** Must be listed under `- **Data Models / Schema:**`.
    *   Table Format: `  - **Table/Model: Name**`
    *   Field Format: `    - `fieldName` : type(string,number,boolean,array,object,pk,fk,date)`
6.  **Connections:** Must be listed under `## 2. DATA FLOW & CONNECTIONS`.
    *   Format: `- **Source** (:Port) sends data to **Target** (:Port)`"#;

pub const EXAMPLE_STYLE_NOTES: &str = "*Dark Mode app interface using 'Glassmorphism' style. \
Translucent cards and panels with background blur effect. Very dark background. Modern bright \
white typography. Diffuse glow effect around interactive elements. Frosted texture, premium and \
technological look. Dribbble top trend style render. Use clean font-awesome icons.*";

/// Trailing section of the default document: generation instructions for the assistant.
pub const INSTRUCTIONS_SECTION: &str = r#"## 3. INSTRUCTIONS
Act as a Senior Software Architect. Based on the structure above, please generate:
1. The project file structure.
2. The necessary configuration files (Language/framework related configuration files (like package.json, composer.json, pom.xml...), Dockerfile(s), docker-compose.yml).
   *Please ensure docker-compose ports match the specified ports above.*
3. The complete, production-ready source code for all components. **STRICTLY FORBIDDEN:** usage of comments like `// TODO`, `// Mock`, `// Implement later`, or placeholder logic. You must implement FULL logic for every function. Authentication must be real (JWT/Session with DB check), database connections must be real (no in-memory arrays), and error handling must be implemented. The entire procedure will fail if any part is missing or incomplete.
4. **IMPORTANT:** Generate the specific SQL schemas as defined in the Data Models section above.
5. **IMPORTANT:** Implement the API routes/endpoints exactly as specified above, with proper request/response handling.
Then, explain what the steps a developer should take next to start the development process based on this architecture."#;
