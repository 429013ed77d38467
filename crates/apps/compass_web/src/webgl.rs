//! Flat-colored WebGL drawing into the XR layer's framebuffer.

use gpu::{Primitive, RenderFrame};
use js_sys::Float32Array;
use wasm_bindgen::JsValue;
use web_sys::{
    WebGlBuffer, WebGlProgram, WebGlRenderingContext as Gl, WebGlShader, WebGlUniformLocation,
};

const VERTEX_SHADER: &str = r#"
attribute vec3 a_position;
uniform mat4 u_view_proj;
void main() {
    gl_Position = u_view_proj * vec4(a_position, 1.0);
}
"#;

const FRAGMENT_SHADER: &str = r#"
precision mediump float;
uniform vec4 u_color;
void main() {
    gl_FragColor = u_color;
}
"#;

pub struct WebGlRenderer {
    gl: Gl,
    program: WebGlProgram,
    buffer: WebGlBuffer,
    position_attrib: u32,
    view_proj: WebGlUniformLocation,
    color: WebGlUniformLocation,
}

impl WebGlRenderer {
    pub fn new(gl: Gl) -> Result<Self, JsValue> {
        let vs = compile_shader(&gl, Gl::VERTEX_SHADER, VERTEX_SHADER)?;
        let fs = compile_shader(&gl, Gl::FRAGMENT_SHADER, FRAGMENT_SHADER)?;
        let program = link_program(&gl, &vs, &fs)?;

        let position_attrib = gl.get_attrib_location(&program, "a_position");
        let position_attrib = u32::try_from(position_attrib)
            .map_err(|_| JsValue::from_str("a_position attribute missing"))?;
        let view_proj = gl
            .get_uniform_location(&program, "u_view_proj")
            .ok_or_else(|| JsValue::from_str("u_view_proj uniform missing"))?;
        let color = gl
            .get_uniform_location(&program, "u_color")
            .ok_or_else(|| JsValue::from_str("u_color uniform missing"))?;
        let buffer = gl
            .create_buffer()
            .ok_or_else(|| JsValue::from_str("create_buffer failed"))?;

        Ok(Self {
            gl,
            program,
            buffer,
            position_attrib,
            view_proj,
            color,
        })
    }

    pub fn gl(&self) -> &Gl {
        &self.gl
    }

    /// Draws on top of the camera feed; only depth is cleared.
    pub fn draw(&self, frame: &RenderFrame) {
        let gl = &self.gl;
        let vp = frame.viewport;
        gl.viewport(vp.x as i32, vp.y as i32, vp.width as i32, vp.height as i32);
        gl.enable(Gl::DEPTH_TEST);
        gl.clear(Gl::DEPTH_BUFFER_BIT);

        gl.use_program(Some(&self.program));
        gl.uniform_matrix4fv_with_f32_array(
            Some(&self.view_proj),
            false,
            &frame.view_projection.to_col_major_f32(),
        );
        gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&self.buffer));
        gl.enable_vertex_attrib_array(self.position_attrib);
        gl.vertex_attrib_pointer_with_i32(self.position_attrib, 3, Gl::FLOAT, false, 0, 0);

        for command in &frame.commands {
            let flat: Vec<f32> = command.vertices.iter().flatten().copied().collect();
            let data = Float32Array::from(flat.as_slice());
            gl.buffer_data_with_array_buffer_view(Gl::ARRAY_BUFFER, &data, Gl::DYNAMIC_DRAW);
            gl.uniform4fv_with_f32_array(Some(&self.color), &command.color);
            let mode = match command.primitive {
                Primitive::Triangles => Gl::TRIANGLES,
                Primitive::LineStrip => Gl::LINE_STRIP,
            };
            gl.draw_arrays(mode, 0, command.vertices.len() as i32);
        }
    }
}

fn compile_shader(gl: &Gl, kind: u32, source: &str) -> Result<WebGlShader, JsValue> {
    let shader = gl
        .create_shader(kind)
        .ok_or_else(|| JsValue::from_str("create_shader failed"))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);
    let ok = gl
        .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false);
    if ok {
        Ok(shader)
    } else {
        let log = gl.get_shader_info_log(&shader).unwrap_or_default();
        Err(JsValue::from_str(&format!("shader compile failed: {log}")))
    }
}

fn link_program(gl: &Gl, vs: &WebGlShader, fs: &WebGlShader) -> Result<WebGlProgram, JsValue> {
    let program = gl
        .create_program()
        .ok_or_else(|| JsValue::from_str("create_program failed"))?;
    gl.attach_shader(&program, vs);
    gl.attach_shader(&program, fs);
    gl.link_program(&program);
    let ok = gl
        .get_program_parameter(&program, Gl::LINK_STATUS)
        .as_bool()
        .unwrap_or(false);
    if ok {
        Ok(program)
    } else {
        let log = gl.get_program_info_log(&program).unwrap_or_default();
        Err(JsValue::from_str(&format!("program link failed: {log}")))
    }
}
